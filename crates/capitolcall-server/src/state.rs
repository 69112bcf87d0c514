//! Shared application state and the store-backed mailbox.

use async_trait::async_trait;
use capitolcall_db::DbPool;
use capitolcall_flow::{store, Engine, Mailbox, StoreError};

/// State shared by every handler.
pub struct AppState {
    pub pool: DbPool,
    pub engine: Engine,
    /// Public base URL webhooks are signed against.
    pub public_url: String,
    /// Provider auth token for signature verification.
    pub auth_token: String,
    pub validate_signatures: bool,
}

/// [`Mailbox`] over the store's inbox tables, with the synchronous SQLite
/// work moved onto the blocking pool.
pub struct SqliteMailbox {
    pool: DbPool,
}

impl SqliteMailbox {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(DbPool) -> Result<(), StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || f(pool))
            .await
            .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl Mailbox for SqliteMailbox {
    async fn record_signup(&self, phone: &str) -> Result<(), StoreError> {
        let phone = phone.to_string();
        self.run(move |pool| store::record_signup(&pool, &phone)).await
    }

    async fn record_message(&self, call_sid: &str, recording_url: &str) -> Result<(), StoreError> {
        let call_sid = call_sid.to_string();
        let recording_url = recording_url.to_string();
        self.run(move |pool| store::record_message(&pool, &call_sid, &recording_url))
            .await
    }
}
