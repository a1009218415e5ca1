//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires an [`Enricher`] to in-process fakes
//! that record every call, an in-memory database for the ledger and
//! transfer history, and a temporary library directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tempfile::TempDir;

use libscraper::config::Config;
use libscraper::ledger::{
    PluginDataStore, SqlitePluginData, UnresolvedLedger, LEDGER_KEY, PLUGIN_ID,
};
use libscraper::metadata::{
    DbHistory, EnrichOptions, Enricher, FileItem, IdentityResolver, ImageFetcher,
    MediaIdentity, MetadataScraper,
};
use libscraper::scanner::{DiscoveryOptions, NameGuess};
use libscraper::service::{ConfigSink, Services};
use libscraper_common::MediaType;
use libscraper_db::models::NewTransfer;
use libscraper_db::pool::{get_conn, init_memory_pool, DbPool};
use libscraper_db::queries::transfer_history;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// A resolver call, as observed by [`FakeResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveCall {
    ById(String, MediaType),
    ByName(String, MediaType),
}

/// Resolves against a fixed catalogue of identities.
#[derive(Default)]
pub struct FakeResolver {
    catalogue: Mutex<Vec<MediaIdentity>>,
    failing: Mutex<bool>,
    pub calls: Mutex<Vec<ResolveCall>>,
}

impl FakeResolver {
    pub fn add(&self, identity: MediaIdentity) {
        self.catalogue.lock().push(identity);
    }

    /// Make every subsequent call fail.
    pub fn fail(&self) {
        *self.failing.lock() = true;
    }

    pub fn calls(&self) -> Vec<ResolveCall> {
        self.calls.lock().clone()
    }
}

impl IdentityResolver for FakeResolver {
    fn resolve_by_id(&self, tmdb_id: &str, media_type: MediaType) -> Result<Option<MediaIdentity>> {
        self.calls
            .lock()
            .push(ResolveCall::ById(tmdb_id.to_string(), media_type));
        if *self.failing.lock() {
            anyhow::bail!("resolver unavailable");
        }
        let Ok(id) = tmdb_id.parse::<u64>() else {
            return Ok(None);
        };
        Ok(self
            .catalogue
            .lock()
            .iter()
            .find(|i| {
                i.tmdb_id == id && (media_type == MediaType::Unknown || i.media_type == media_type)
            })
            .cloned())
    }

    fn resolve_by_name(&self, guess: &NameGuess) -> Result<Option<MediaIdentity>> {
        self.calls
            .lock()
            .push(ResolveCall::ByName(guess.title.clone(), guess.media_type));
        if *self.failing.lock() {
            anyhow::bail!("resolver unavailable");
        }
        Ok(self
            .catalogue
            .lock()
            .iter()
            .find(|i| i.title == guess.title)
            .cloned())
    }
}

/// Counts image requests and leaves the identity untouched.
#[derive(Default)]
pub struct FakeImages {
    pub requested: Mutex<Vec<u64>>,
}

impl ImageFetcher for FakeImages {
    fn obtain_images(&self, identity: &mut MediaIdentity) -> Result<()> {
        self.requested.lock().push(identity.tmdb_id);
        Ok(())
    }
}

/// One recorded scrape.
#[derive(Debug, Clone)]
pub struct ScrapeCall {
    pub item: FileItem,
    pub identity: MediaIdentity,
    pub overwrite: bool,
}

/// Records scrapes without touching the filesystem.
#[derive(Default)]
pub struct RecordingScraper {
    pub calls: Mutex<Vec<ScrapeCall>>,
}

impl RecordingScraper {
    pub fn calls(&self) -> Vec<ScrapeCall> {
        self.calls.lock().clone()
    }

    pub fn scraped_names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.item.name.clone()).collect()
    }
}

impl MetadataScraper for RecordingScraper {
    fn scrape(&self, item: &FileItem, identity: &MediaIdentity, overwrite: bool) -> Result<()> {
        self.calls.lock().push(ScrapeCall {
            item: item.clone(),
            identity: identity.clone(),
            overwrite,
        });
        Ok(())
    }
}

/// Counts config resets.
#[derive(Default)]
pub struct RecordingSink {
    pub run_once_cleared: Mutex<usize>,
    pub ids_cleared: Mutex<usize>,
}

impl ConfigSink for RecordingSink {
    fn clear_run_once(&self) -> Result<()> {
        *self.run_once_cleared.lock() += 1;
        Ok(())
    }

    fn clear_manual_ids(&self) -> Result<()> {
        *self.ids_cleared.lock() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Fakes, database and library directory for one test.
pub struct TestHarness {
    pub db: DbPool,
    pub resolver: Arc<FakeResolver>,
    pub images: Arc<FakeImages>,
    pub scraper: Arc<RecordingScraper>,
    pub sink: Arc<RecordingSink>,
    pub ledger: UnresolvedLedger,
    pub library: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ledger = UnresolvedLedger::new(Arc::new(SqlitePluginData::new(db.clone())));
        Self {
            db,
            resolver: Arc::new(FakeResolver::default()),
            images: Arc::new(FakeImages::default()),
            scraper: Arc::new(RecordingScraper::default()),
            sink: Arc::new(RecordingSink::default()),
            ledger,
            library: tempfile::tempdir().expect("failed to create library dir"),
        }
    }

    /// Enricher with default options.
    pub fn enricher(&self) -> Enricher {
        self.enricher_with(EnrichOptions::default())
    }

    pub fn enricher_with(&self, options: EnrichOptions) -> Enricher {
        Enricher::new(
            self.resolver.clone(),
            self.images.clone(),
            self.scraper.clone(),
            Arc::new(DbHistory::new(self.db.clone())),
            options,
        )
    }

    /// Services bundle for plugin tests.
    pub fn services(&self) -> Services {
        Services {
            enricher: self.enricher(),
            ledger: self.ledger.clone(),
            config_sink: self.sink.clone(),
        }
    }

    /// Create `rel` (and its parents) under the library directory.
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.library.path().join(rel);
        fs::create_dir_all(&path).expect("failed to create directory");
        path
    }

    /// Path of `rel` under the library directory, without creating it.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.library.path().join(rel)
    }

    /// Discovery options for the given root and exclusion lines, relative
    /// to the library directory. A root may carry a `#label` suffix.
    pub fn discovery(&self, roots: &[&str], exclusions: &[&str]) -> DiscoveryOptions {
        let mut config = Config::default();
        config.scraper.scan_roots = roots
            .iter()
            .map(|r| self.root_line(r))
            .collect::<Vec<_>>()
            .join("\n");
        config.scraper.exclude_roots = exclusions
            .iter()
            .map(|e| self.path(e).display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        DiscoveryOptions::from_config(&config.scraper, &config.library)
    }

    /// Scan-roots line for `root`, keeping any `#label` suffix.
    pub fn root_line(&self, root: &str) -> String {
        match root.rsplit_once('#') {
            Some((rel, label)) => format!("{}#{}", self.path(rel).display(), label),
            None => self.path(root).display().to_string(),
        }
    }

    /// Record a transfer so the history lookup finds `title`.
    pub fn record_transfer(&self, tmdb_id: u64, media_type: MediaType, title: &str) {
        let conn = get_conn(&self.db).expect("failed to get db connection");
        transfer_history::record(
            &conn,
            &NewTransfer {
                tmdb_id,
                media_type,
                title,
                year: None,
                src_path: None,
                dest_path: None,
            },
        )
        .expect("failed to record transfer");
    }

    /// Store raw ledger text, bypassing entry formatting.
    pub fn write_ledger(&self, text: &str) {
        SqlitePluginData::new(self.db.clone())
            .save(PLUGIN_ID, LEDGER_KEY, text)
            .expect("failed to write ledger");
    }

    pub fn ledger_lines(&self) -> Vec<String> {
        self.ledger.lines().expect("failed to read ledger")
    }
}

/// Write an NFO carrying `tmdb_id` into `dir`.
pub fn write_nfo(dir: &Path, file_name: &str, tmdb_id: &str) {
    fs::write(
        dir.join(file_name),
        format!("<movie><title>x</title><tmdbid>{tmdb_id}</tmdbid></movie>"),
    )
    .expect("failed to write nfo");
}

pub fn movie(tmdb_id: u64, title: &str) -> MediaIdentity {
    MediaIdentity::new(tmdb_id, MediaType::Movie, title)
}

pub fn tv(tmdb_id: u64, title: &str) -> MediaIdentity {
    MediaIdentity::new(tmdb_id, MediaType::Tv, title)
}
