//! SQLite-backed lookup caches.
//!
//! Zip code lookups store the raw upstream payload with a freshness
//! window; entity ids never change, so they are cached forever.

use capitolcall_db::DbPool;
use capitolcall_flow::DirectoryError;
use rusqlite::OptionalExtension;

fn cache_err(err: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::Cache(err.to_string())
}

/// The cached legislator payload for a zip code, if present and fresher
/// than `max_age_hours`.
pub fn zip_payload(
    pool: &DbPool,
    zipcode: &str,
    max_age_hours: i64,
) -> Result<Option<String>, DirectoryError> {
    let conn = pool.get().map_err(cache_err)?;
    let cutoff = format!("-{max_age_hours} hours");
    conn.query_row(
        "SELECT payload FROM legislators_by_zip
          WHERE zipcode = ?1 AND fetched_at > datetime('now', ?2)",
        [zipcode, cutoff.as_str()],
        |row| row.get(0),
    )
    .optional()
    .map_err(cache_err)
}

pub fn store_zip_payload(
    pool: &DbPool,
    zipcode: &str,
    payload: &str,
) -> Result<(), DirectoryError> {
    let conn = pool.get().map_err(cache_err)?;
    conn.execute(
        "INSERT INTO legislators_by_zip (zipcode, payload, fetched_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(zipcode) DO UPDATE
            SET payload = excluded.payload, fetched_at = excluded.fetched_at",
        [zipcode, payload],
    )
    .map_err(cache_err)?;
    Ok(())
}

pub fn entity_id(pool: &DbPool, crp_id: &str) -> Result<Option<String>, DirectoryError> {
    let conn = pool.get().map_err(cache_err)?;
    conn.query_row(
        "SELECT entity_id FROM crp_entity_ids WHERE crp_id = ?1",
        [crp_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(cache_err)
}

pub fn store_entity_id(
    pool: &DbPool,
    crp_id: &str,
    entity_id: &str,
) -> Result<(), DirectoryError> {
    let conn = pool.get().map_err(cache_err)?;
    conn.execute(
        "INSERT OR IGNORE INTO crp_entity_ids (crp_id, entity_id) VALUES (?1, ?2)",
        [crp_id, entity_id],
    )
    .map_err(cache_err)?;
    Ok(())
}
