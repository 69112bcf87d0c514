//! Error types for the call-flow engine.

use crate::services::DirectoryError;
use thiserror::Error;

/// Errors from the call-document store and inbox tables.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to check a connection out of the pool.
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A query or statement failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The stored call document could not be serialized or parsed.
    #[error("call document error: {0}")]
    Document(#[from] serde_json::Error),

    /// A blocking database task was cancelled or panicked.
    #[error("database task failed: {0}")]
    Task(String),
}

/// Errors surfaced by a conversation step.
///
/// Bad caller input is never an error; steps answer it with spoken
/// apologies and redirects. These variants cover infrastructure failures
/// only, and the server answers them with HTTP 500 so the provider retries
/// from the last saved state instead of looping on our own markup.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
