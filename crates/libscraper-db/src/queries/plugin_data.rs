//! Plugin data queries.
//!
//! Each record is a text blob addressed by `(plugin_id, key)`. Saving
//! replaces any existing value for the same address.

use libscraper_common::{Error, Result};
use rusqlite::{Connection, OptionalExtension};

/// Save `value` under `(plugin_id, key)`, replacing any previous value.
pub fn save(conn: &Connection, plugin_id: &str, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO plugin_data (plugin_id, key, value, updated_at)
         VALUES (:plugin_id, :key, :value, datetime('now'))
         ON CONFLICT (plugin_id, key)
         DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":plugin_id": plugin_id,
            ":key": key,
            ":value": value,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get the value stored under `(plugin_id, key)`.
///
/// # Returns
///
/// * `Ok(Some(String))` - The stored value (possibly empty)
/// * `Ok(None)` - If nothing is stored
/// * `Err(Error)` - If a database error occurs
pub fn get(conn: &Connection, plugin_id: &str, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM plugin_data WHERE plugin_id = :plugin_id AND key = :key",
        rusqlite::named_params! { ":plugin_id": plugin_id, ":key": key },
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete the value stored under `(plugin_id, key)`.
///
/// Returns `true` when a record was removed.
pub fn delete(conn: &Connection, plugin_id: &str, key: &str) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM plugin_data WHERE plugin_id = :plugin_id AND key = :key",
            rusqlite::named_params! { ":plugin_id": plugin_id, ":key": key },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}
