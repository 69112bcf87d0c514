//! HTTP server for the Capitol Call voice service.
//!
//! Exposes the conversation engine as a tree of provider voice webhooks
//! plus a health endpoint. Requests are signature-checked and parsed by
//! the webhook middleware, then driven through one engine step each.

pub mod config;
pub mod middleware;
pub mod routes;
pub mod signature;
pub mod state;

pub use config::{load_config, Config};
pub use routes::app;
pub use state::{AppState, SqliteMailbox};
