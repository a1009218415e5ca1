//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use libscraper_common::MediaType;

/// A transfer-history row: the title media was filed under when it was
/// organized into the library.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferHistory {
    pub id: i64,
    pub tmdb_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<String>,
    pub src_path: Option<String>,
    pub dest_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new [`TransferHistory`] row.
#[derive(Debug, Clone)]
pub struct NewTransfer<'a> {
    pub tmdb_id: u64,
    pub media_type: MediaType,
    pub title: &'a str,
    pub year: Option<&'a str>,
    pub src_path: Option<&'a str>,
    pub dest_path: Option<&'a str>,
}
