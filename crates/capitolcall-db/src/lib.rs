//! Database layer for Capitol Call.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table in Capitol Call is created
//! through versioned migrations managed by this crate: the per-call
//! documents, the SMS signup and recorded-message inboxes, the zip-code and
//! entity-id lookup caches, and the translation table.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: one small single-server service, no external
//!   database process. WAL allows concurrent readers with a single writer,
//!   which matches the access pattern of a webhook service where only one
//!   caller ever drives a given call document.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so migrations ship with the server and cannot drift
//!   from the code that depends on them.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
