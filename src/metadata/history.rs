//! Transfer-history backed [`HistoryLookup`].

use anyhow::Context;
use libscraper_common::MediaType;
use libscraper_db::pool::{get_conn, DbPool};
use libscraper_db::queries::transfer_history;

use super::provider::HistoryLookup;

/// Reads recorded titles from the `transfer_history` table.
#[derive(Clone)]
pub struct DbHistory {
    pool: DbPool,
}

impl DbHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl HistoryLookup for DbHistory {
    fn recorded_title(
        &self,
        tmdb_id: u64,
        media_type: MediaType,
    ) -> anyhow::Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        let row = transfer_history::get_by_type_tmdbid(&conn, tmdb_id, media_type)
            .with_context(|| format!("Failed to look up transfer history for {tmdb_id}"))?;
        Ok(row.map(|r| r.title))
    }
}
