//! Call-document persistence and the outreach inboxes.
//!
//! Functions here are synchronous and take the pool directly; the server
//! wraps them in blocking-task spawns. The call document is stored whole as
//! JSON alongside a few scalar columns for indexing, and writes are
//! last-writer-wins, which is safe because the provider serializes webhooks
//! per call.

use crate::error::StoreError;
use crate::session::{Call, RequestParams};
use capitolcall_db::DbPool;
use capitolcall_twiml::TranslationTable;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Loads the call document for this webhook, creating it on first contact.
///
/// Creation is idempotent: a racing duplicate webhook may insert the row
/// between our read and our insert, so the insert ignores conflicts and the
/// row is re-read. Either way the request's status is appended to the log
/// before returning; the caller persists it via [`save`] once the step
/// succeeds.
pub fn load_or_create(pool: &DbPool, request: &RequestParams) -> Result<Call, StoreError> {
    let conn = pool.get()?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT document FROM calls WHERE call_sid = ?1",
            [request.call_sid()],
            |row| row.get(0),
        )
        .optional()?;

    let mut call: Call = match existing {
        Some(document) => serde_json::from_str(&document)?,
        None => {
            let fresh = Call::new(request);
            let document = serde_json::to_string(&fresh)?;
            conn.execute(
                "INSERT OR IGNORE INTO calls
                     (call_sid, from_number, to_number, caller_name, current_status, document)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    fresh.call_sid,
                    fresh.from,
                    fresh.to,
                    fresh.caller_name,
                    fresh.current_status.as_str(),
                    document,
                ],
            )?;
            let document: String = conn.query_row(
                "SELECT document FROM calls WHERE call_sid = ?1",
                [request.call_sid()],
                |row| row.get(0),
            )?;
            serde_json::from_str(&document)?
        }
    };

    call.log_status(request.call_status(), Utc::now());
    Ok(call)
}

/// Persists the updated call document.
pub fn save(pool: &DbPool, call: &Call) -> Result<(), StoreError> {
    let conn = pool.get()?;
    let document = serde_json::to_string(call)?;
    conn.execute(
        "UPDATE calls
            SET current_status = ?2, document = ?3, updated_at = datetime('now')
          WHERE call_sid = ?1",
        params![call.call_sid, call.current_status.as_str(), document],
    )?;
    Ok(())
}

/// Queues a phone number for SMS updates.
pub fn record_signup(pool: &DbPool, phone: &str) -> Result<(), StoreError> {
    let conn = pool.get()?;
    conn.execute("INSERT INTO sms_signups (phone) VALUES (?1)", [phone])?;
    Ok(())
}

/// Files a recorded feedback message.
pub fn record_message(pool: &DbPool, call_sid: &str, recording_url: &str) -> Result<(), StoreError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO recorded_messages (call_sid, recording_url) VALUES (?1, ?2)",
        params![call_sid, recording_url],
    )?;
    Ok(())
}

/// Loads the pre-seeded prompt translations into memory. Called once at
/// startup to build the speech renderer.
pub fn load_translations(pool: &DbPool) -> Result<TranslationTable, StoreError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT language, text_hash, translation FROM translations")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut table = TranslationTable::new();
    for row in rows {
        let (language, hash, translation) = row?;
        table.insert_hashed(&language, &hash, &translation);
    }
    Ok(table)
}
