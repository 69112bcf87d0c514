//! The Capitol Call call-flow engine.
//!
//! Telephony webhooks are stateless: each request carries only a call id,
//! the digits the caller pressed, and a handful of step parameters. This
//! crate turns that request sequence into a coherent multi-step
//! conversation:
//!
//! - [`session`]: the per-call document (status log + typed context) and
//!   the typed view over incoming request parameters. All cross-request
//!   state lives here; there is no ambient/global call state.
//! - [`store`]: idempotent load-or-create and last-writer-wins save of the
//!   call document, plus the signup/feedback inbox queries.
//! - [`menu`]: the static menu graph: named menus, numbered choices with
//!   parameter whitelists, and tagged parent references for back-navigation.
//! - [`dispatch`]: resolves a pressed digit against a menu (digit `9` is
//!   always "back") and redirects to the chosen action, recovering from any
//!   bad selection with a spoken apology.
//! - [`gates`]: precondition checks (language, zip code, legislator, bill)
//!   that either pass or intercept the request with a prompt.
//! - [`steps`]: the [`Engine`] with one method per conversation step,
//!   composing gates, dispatch, and context reads/writes.
//!
//! The engine talks to the outside world through two seams: [`Directory`]
//! (the congressional lookup service) and [`Mailbox`] (signup/feedback
//! persistence). Both are trait objects so tests can drive full
//! conversations against canned data.

pub mod dispatch;
mod error;
pub mod gates;
pub mod menu;
mod services;
pub mod session;
pub mod steps;
pub mod store;

pub use error::{FlowError, StoreError};
pub use services::{Directory, DirectoryError, Mailbox};
pub use steps::Engine;
