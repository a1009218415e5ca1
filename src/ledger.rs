//! The unresolved-directory ledger.
//!
//! Directories the automatic pass could not resolve are stored as one text
//! record, `path#label` per line, under a fixed plugin id and key. The manual
//! pass pairs those lines, by position, with user-supplied TMDB ids, so line
//! order is significant and must match discovery order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use libscraper_common::MediaType;
use libscraper_db::pool::{get_conn, DbPool};
use libscraper_db::queries::plugin_data;

/// Plugin id the ledger is stored under.
pub const PLUGIN_ID: &str = "LibraryScraperLin";
/// Key the ledger is stored under.
pub const LEDGER_KEY: &str = "unscrapfiles";

/// A ledger line that does not have the `path#label` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed ledger line: {0:?}")]
pub struct MalformedEntry(pub String);

/// One unresolved directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
    pub path: PathBuf,
    /// Media type label; may be empty.
    pub label: String,
}

impl UnresolvedEntry {
    pub fn new(path: impl Into<PathBuf>, media_type: MediaType) -> Self {
        Self {
            path: path.into(),
            label: media_type.label().to_string(),
        }
    }

    /// Parse a ledger line. The label follows the last `#`, so paths that
    /// contain `#` round-trip; it is optional and may be empty. A line with
    /// no path is malformed.
    pub fn parse(line: &str) -> Result<Self, MalformedEntry> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (path, label) = line.rsplit_once('#').unwrap_or((line, ""));
        if path.trim().is_empty() {
            return Err(MalformedEntry(line.to_string()));
        }
        Ok(Self {
            path: PathBuf::from(path),
            label: label.trim().to_string(),
        })
    }

    /// The media type named by the label; empty or unknown labels are
    /// `Unknown`.
    pub fn media_type(&self) -> MediaType {
        MediaType::from_record_label(&self.label).unwrap_or(MediaType::Unknown)
    }

    /// The persisted line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}#{}", self.path.display(), self.label)
    }
}

/// Serialize entries as newline-terminated lines.
pub fn format_entries(entries: &[UnresolvedEntry]) -> String {
    entries.iter().map(|e| e.to_line() + "\n").collect()
}

/// Split ledger text into its non-empty lines, in order.
pub fn ledger_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.trim().is_empty()).collect()
}

/// Key/value records scoped by plugin id.
pub trait PluginDataStore: Send + Sync {
    fn save(&self, plugin_id: &str, key: &str, value: &str) -> Result<()>;
    fn get(&self, plugin_id: &str, key: &str) -> Result<Option<String>>;
    fn delete(&self, plugin_id: &str, key: &str) -> Result<bool>;
}

/// [`PluginDataStore`] backed by the `plugin_data` table.
#[derive(Clone)]
pub struct SqlitePluginData {
    pool: DbPool,
}

impl SqlitePluginData {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PluginDataStore for SqlitePluginData {
    fn save(&self, plugin_id: &str, key: &str, value: &str) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        plugin_data::save(&conn, plugin_id, key, value)?;
        Ok(())
    }

    fn get(&self, plugin_id: &str, key: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        Ok(plugin_data::get(&conn, plugin_id, key)?)
    }

    fn delete(&self, plugin_id: &str, key: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        Ok(plugin_data::delete(&conn, plugin_id, key)?)
    }
}

/// Typed access to the ledger record.
#[derive(Clone)]
pub struct UnresolvedLedger {
    store: Arc<dyn PluginDataStore>,
}

impl UnresolvedLedger {
    pub fn new(store: Arc<dyn PluginDataStore>) -> Self {
        Self { store }
    }

    /// Raw ledger text, if any is stored.
    pub fn load(&self) -> Result<Option<String>> {
        self.store.get(PLUGIN_ID, LEDGER_KEY)
    }

    /// Non-empty ledger lines, in order.
    pub fn lines(&self) -> Result<Vec<String>> {
        Ok(self
            .load()?
            .map(|text| ledger_lines(&text).into_iter().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Replace the whole ledger with `entries` (possibly none).
    pub fn replace(&self, entries: &[UnresolvedEntry]) -> Result<()> {
        self.store
            .save(PLUGIN_ID, LEDGER_KEY, &format_entries(entries))
    }

    /// Delete the ledger. Returns `true` when a record existed.
    pub fn clear(&self) -> Result<bool> {
        self.store.delete(PLUGIN_ID, LEDGER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libscraper_db::pool::init_memory_pool;

    fn ledger() -> UnresolvedLedger {
        let pool = init_memory_pool().unwrap();
        UnresolvedLedger::new(Arc::new(SqlitePluginData::new(pool)))
    }

    #[test]
    fn parse_with_label() {
        let entry = UnresolvedEntry::parse("/a/b#电影").unwrap();
        assert_eq!(entry.path, PathBuf::from("/a/b"));
        assert_eq!(entry.media_type(), MediaType::Movie);
    }

    #[test]
    fn parse_tolerates_missing_or_empty_label() {
        let bare = UnresolvedEntry::parse("/a/b").unwrap();
        let empty = UnresolvedEntry::parse("/a/b#").unwrap();
        assert_eq!(bare, empty);
        assert_eq!(bare.label, "");
        assert_eq!(bare.media_type(), MediaType::Unknown);
    }

    #[test]
    fn parse_unknown_label() {
        let entry = UnresolvedEntry::parse("/a/b#未知").unwrap();
        assert_eq!(entry.media_type(), MediaType::Unknown);
    }

    #[test]
    fn parse_splits_label_at_last_hash() {
        let entry = UnresolvedEntry::parse("/a/C#/b#电影").unwrap();
        assert_eq!(entry.path, PathBuf::from("/a/C#/b"));
        assert_eq!(entry.media_type(), MediaType::Movie);
    }

    #[test]
    fn parse_rejects_missing_path() {
        assert_eq!(
            UnresolvedEntry::parse("#电影"),
            Err(MalformedEntry("#电影".to_string()))
        );
        assert!(UnresolvedEntry::parse("  #").is_err());
    }

    #[test]
    fn hash_in_path_round_trips() {
        let entries = vec![
            UnresolvedEntry::new("/media/C#/Shows/Foo", MediaType::Tv),
            UnresolvedEntry::new("/media/#1 Hits", MediaType::Unknown),
        ];
        let text = format_entries(&entries);
        let parsed: Vec<UnresolvedEntry> = ledger_lines(&text)
            .into_iter()
            .map(|l| UnresolvedEntry::parse(l).unwrap())
            .collect();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn format_terminates_every_line() {
        let entries = vec![
            UnresolvedEntry::new("/media/Movies/Foo (2020)", MediaType::Movie),
            UnresolvedEntry::new("/media/TV/Bar", MediaType::Tv),
        ];
        assert_eq!(
            format_entries(&entries),
            "/media/Movies/Foo (2020)#电影\n/media/TV/Bar#电视剧\n"
        );
        assert_eq!(format_entries(&[]), "");
    }

    #[test]
    fn replace_then_read_back() {
        let ledger = ledger();
        let entries = vec![
            UnresolvedEntry::new("/a/b", MediaType::Movie),
            UnresolvedEntry::new("/a/c", MediaType::Tv),
            UnresolvedEntry::new("/a/d", MediaType::Unknown),
        ];
        ledger.replace(&entries).unwrap();

        let parsed: Vec<UnresolvedEntry> = ledger
            .lines()
            .unwrap()
            .iter()
            .map(|l| UnresolvedEntry::parse(l).unwrap())
            .collect();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn replace_with_nothing_keeps_an_empty_record() {
        let ledger = ledger();
        ledger
            .replace(&[UnresolvedEntry::new("/a/b", MediaType::Movie)])
            .unwrap();
        ledger.replace(&[]).unwrap();

        assert_eq!(ledger.load().unwrap().as_deref(), Some(""));
        assert!(ledger.lines().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_record() {
        let ledger = ledger();
        ledger
            .replace(&[UnresolvedEntry::new("/a/b", MediaType::Movie)])
            .unwrap();

        assert!(ledger.clear().unwrap());
        assert_eq!(ledger.load().unwrap(), None);
        assert!(!ledger.clear().unwrap());
    }
}
