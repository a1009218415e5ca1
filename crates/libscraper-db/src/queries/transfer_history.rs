//! Transfer history queries.
//!
//! The scraper only reads this table, to keep display titles stable across
//! re-scans; rows are written by whatever organizes files into the library.

use chrono::{DateTime, Utc};
use libscraper_common::{Error, MediaType, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{NewTransfer, TransferHistory};

const SELECT_COLUMNS: &str =
    "SELECT id, tmdb_id, media_type, title, year, src_path, dest_path, created_at
     FROM transfer_history";

fn row_to_history(row: &Row<'_>) -> rusqlite::Result<TransferHistory> {
    let tmdb_id: i64 = row.get(1)?;
    let media_type: String = row.get(2)?;
    let created_at: String = row.get(7)?;

    Ok(TransferHistory {
        id: row.get(0)?,
        tmdb_id: tmdb_id as u64,
        media_type: MediaType::from_record_label(&media_type).unwrap_or(MediaType::Unknown),
        title: row.get(3)?,
        year: row.get(4)?,
        src_path: row.get(5)?,
        dest_path: row.get(6)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Record a transfer.
pub fn record(conn: &Connection, transfer: &NewTransfer<'_>) -> Result<TransferHistory> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO transfer_history
            (tmdb_id, media_type, title, year, src_path, dest_path, created_at)
         VALUES (:tmdb_id, :media_type, :title, :year, :src_path, :dest_path, :created_at)",
        rusqlite::named_params! {
            ":tmdb_id": transfer.tmdb_id as i64,
            ":media_type": transfer.media_type.label(),
            ":title": transfer.title,
            ":year": transfer.year,
            ":src_path": transfer.src_path,
            ":dest_path": transfer.dest_path,
            ":created_at": created_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(TransferHistory {
        id: conn.last_insert_rowid(),
        tmdb_id: transfer.tmdb_id,
        media_type: transfer.media_type,
        title: transfer.title.to_string(),
        year: transfer.year.map(str::to_string),
        src_path: transfer.src_path.map(str::to_string),
        dest_path: transfer.dest_path.map(str::to_string),
        created_at,
    })
}

/// Get the most recent transfer for a TMDB id and media type.
///
/// # Returns
///
/// * `Ok(Some(TransferHistory))` - The latest matching row
/// * `Ok(None)` - If the identity was never transferred
/// * `Err(Error)` - If a database error occurs
pub fn get_by_type_tmdbid(
    conn: &Connection,
    tmdb_id: u64,
    media_type: MediaType,
) -> Result<Option<TransferHistory>> {
    conn.query_row(
        &format!(
            "{SELECT_COLUMNS}
             WHERE tmdb_id = :tmdb_id AND media_type = :media_type
             ORDER BY id DESC LIMIT 1"
        ),
        rusqlite::named_params! {
            ":tmdb_id": tmdb_id as i64,
            ":media_type": media_type.label(),
        },
        row_to_history,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}
