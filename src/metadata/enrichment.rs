//! Identity resolution and enrichment for a single scan target.
//!
//! The [`Enricher`] owns the four delegates and is shared by both passes:
//! the automatic pass calls [`Enricher::resolve`] then [`Enricher::enrich`],
//! the manual pass supplies the TMDB id itself and goes straight to
//! [`Enricher::resolve_by_id`].

use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use libscraper_common::paths::{dir_item_path, dir_name, dir_stem};
use libscraper_common::{MediaType, OverwriteMode};
use tracing::{debug, info};

use super::provider::{
    FileItem, FileKind, HistoryLookup, IdentityResolver, ImageFetcher, MediaIdentity,
    MetadataScraper,
};
use crate::scanner::{guess_from_path, nfo, ScanTarget};

/// Options that shape every enrichment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    pub mode: OverwriteMode,
    /// When false, titles recorded in the transfer history win over the
    /// resolved title.
    pub follow_upstream: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            mode: OverwriteMode::KeepExisting,
            follow_upstream: true,
        }
    }
}

/// Resolves scan targets to identities and scrapes them.
#[derive(Clone)]
pub struct Enricher {
    resolver: Arc<dyn IdentityResolver>,
    images: Arc<dyn ImageFetcher>,
    scraper: Arc<dyn MetadataScraper>,
    history: Arc<dyn HistoryLookup>,
    options: EnrichOptions,
}

impl Enricher {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        images: Arc<dyn ImageFetcher>,
        scraper: Arc<dyn MetadataScraper>,
        history: Arc<dyn HistoryLookup>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            resolver,
            images,
            scraper,
            history,
            options,
        }
    }

    /// A copy sharing the same delegates with different options.
    pub fn with_options(&self, options: EnrichOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// Resolve a target automatically: a TMDB id from the local NFO when
    /// there is one, otherwise a name match.
    pub fn resolve(&self, target: &ScanTarget) -> Result<Option<MediaIdentity>> {
        if let Some(tmdb_id) = local_tmdb_id(&target.path, target.media_type) {
            info!(path = %target.path.display(), tmdb_id = %tmdb_id, "Read tmdbid from local NFO");
            return self.resolve_by_id(&tmdb_id, target.media_type);
        }

        let mut guess = guess_from_path(&target.path);
        guess.media_type = target.media_type;
        debug!(path = %target.path.display(), guess = ?guess, "Resolving by name");
        self.resolver.resolve_by_name(&guess)
    }

    /// Resolve a known TMDB id.
    pub fn resolve_by_id(
        &self,
        tmdb_id: &str,
        media_type: MediaType,
    ) -> Result<Option<MediaIdentity>> {
        self.resolver.resolve_by_id(tmdb_id, media_type)
    }

    /// Fetch artwork and scrape `dir` for `identity`.
    pub fn enrich(&self, dir: &Path, mut identity: MediaIdentity) -> Result<()> {
        if !self.options.follow_upstream {
            if let Some(title) = self
                .history
                .recorded_title(identity.tmdb_id, identity.media_type)?
            {
                debug!(
                    tmdb_id = identity.tmdb_id,
                    resolved = %identity.title,
                    recorded = %title,
                    "Using recorded title"
                );
                identity.title = title;
            }
        }

        self.images.obtain_images(&mut identity)?;

        let item = dir_file_item(dir)?;
        self.scraper
            .scrape(&item, &identity, self.options.mode.overwrite())?;
        info!("{} scraped", dir.display());
        Ok(())
    }
}

/// TMDB id from the NFO files a directory of `media_type` would carry.
///
/// Movies check `movie.nfo`, then `<directory stem>.nfo` (the directory name
/// up to its last `.`); everything else checks `tvshow.nfo`.
pub fn local_tmdb_id(dir: &Path, media_type: MediaType) -> Option<String> {
    match media_type {
        MediaType::Movie => nfo::tmdb_id_from_nfo(&dir.join("movie.nfo"))
            .or_else(|| nfo::tmdb_id_from_nfo(&dir.join(format!("{}.nfo", dir_stem(dir))))),
        MediaType::Tv | MediaType::Unknown => nfo::tmdb_id_from_nfo(&dir.join("tvshow.nfo")),
    }
}

/// Describe `dir` the way the scraper expects.
pub fn dir_file_item(dir: &Path) -> Result<FileItem> {
    let modified = std::fs::metadata(dir)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read mtime of {:?}", dir))?;
    let modify_time = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    Ok(FileItem {
        storage: "local".to_string(),
        kind: FileKind::Dir,
        path: dir_item_path(dir),
        name: dir_name(dir),
        basename: dir_stem(dir),
        modify_time,
    })
}
