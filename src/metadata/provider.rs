//! Delegate traits and shared types for identity resolution and enrichment.
//!
//! The scan passes never talk to TMDB or the filesystem writer directly;
//! they go through [`IdentityResolver`], [`ImageFetcher`],
//! [`MetadataScraper`] and [`HistoryLookup`], so that hosts (and tests) can
//! plug in their own implementations. All calls are blocking: each pass runs
//! on its own worker thread.

use libscraper_common::MediaType;
use serde::{Deserialize, Serialize};

use crate::scanner::NameGuess;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A resolved TMDB identity, the unit every enrichment call works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaIdentity {
    /// TMDB numeric identifier.
    pub tmdb_id: u64,
    /// Movie or TV; resolvers never return `Unknown`.
    pub media_type: MediaType,
    /// Localised display title. May be replaced by a historical title before
    /// scraping.
    pub title: String,
    /// Original-language title, if different from `title`.
    pub original_title: Option<String>,
    /// Release or first-air year.
    pub year: Option<u16>,
    /// Synopsis / overview text.
    pub overview: Option<String>,
    /// IMDb id, when the provider knows it.
    pub imdb_id: Option<String>,
    /// Artwork, filled in by [`ImageFetcher::obtain_images`].
    #[serde(default)]
    pub images: MediaImages,
}

impl MediaIdentity {
    /// A bare identity with no descriptive metadata.
    pub fn new(tmdb_id: u64, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            tmdb_id,
            media_type,
            title: title.into(),
            original_title: None,
            year: None,
            overview: None,
            imdb_id: None,
            images: MediaImages::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Artwork selected for an identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaImages {
    /// Best poster URL.
    pub poster: Option<String>,
    /// Best backdrop / fanart URL.
    pub backdrop: Option<String>,
}

/// A single candidate image with its community score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Fully-qualified URL to the image.
    pub url: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// ISO-639-1 language code for the image content, if applicable.
    pub language: Option<String>,
    /// Community vote average for this image (higher is better).
    pub vote_average: f64,
}

// ---------------------------------------------------------------------------
// File items
// ---------------------------------------------------------------------------

/// Kind of entry a [`FileItem`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Dir,
}

/// Storage-neutral description of the entry being scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    /// Storage backend name; the scan passes always use `"local"`.
    pub storage: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Forward-slash path; directories end with exactly one `/`.
    pub path: String,
    /// Final path component.
    pub name: String,
    /// Final path component without its extension.
    pub basename: String,
    /// Modification time, seconds since the Unix epoch.
    pub modify_time: f64,
}

// ---------------------------------------------------------------------------
// Delegate traits
// ---------------------------------------------------------------------------

/// Resolves directories to TMDB identities.
pub trait IdentityResolver: Send + Sync {
    /// Resolve a known TMDB id. `media_type` is the type the caller already
    /// believes the item has; `Unknown` lets the resolver try both.
    fn resolve_by_id(
        &self,
        tmdb_id: &str,
        media_type: MediaType,
    ) -> anyhow::Result<Option<MediaIdentity>>;

    /// Resolve by best-effort name match.
    fn resolve_by_name(&self, guess: &NameGuess) -> anyhow::Result<Option<MediaIdentity>>;
}

/// Populates [`MediaIdentity::images`].
pub trait ImageFetcher: Send + Sync {
    fn obtain_images(&self, identity: &mut MediaIdentity) -> anyhow::Result<()>;
}

/// Writes metadata and artwork for an identity next to the media.
pub trait MetadataScraper: Send + Sync {
    fn scrape(
        &self,
        item: &FileItem,
        identity: &MediaIdentity,
        overwrite: bool,
    ) -> anyhow::Result<()>;
}

/// Titles recorded when media was previously organised into the library.
pub trait HistoryLookup: Send + Sync {
    fn recorded_title(
        &self,
        tmdb_id: u64,
        media_type: MediaType,
    ) -> anyhow::Result<Option<String>>;
}
