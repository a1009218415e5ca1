//! Identity resolution and enrichment delegates.
//!
//! # Module layout
//!
//! - [`provider`] -- Delegate traits and shared data types.
//! - [`providers`] -- Concrete resolvers (TMDB).
//! - [`local`] -- NFO and artwork writer for local directories.
//! - [`history`] -- Recorded-title lookup backed by the database.
//! - [`enrichment`] -- Per-target resolution and scraping.

pub mod enrichment;
pub mod history;
pub mod local;
pub mod provider;
pub mod providers;

pub use enrichment::{EnrichOptions, Enricher};
pub use history::DbHistory;
pub use local::LocalScraper;
pub use provider::{
    FileItem, FileKind, HistoryLookup, IdentityResolver, ImageFetcher, ImageInfo, MediaIdentity,
    MediaImages, MetadataScraper,
};
pub use providers::TmdbProvider;
