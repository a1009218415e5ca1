//! Libscraper - media library scraper
//!
//! Walks library roots, resolves each media directory to a TMDB identity
//! (local NFO first, then a name match), writes metadata and artwork, and
//! keeps a ledger of directories that need a manually supplied id.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod ledger;
pub mod metadata;
pub mod passes;
pub mod scanner;
pub mod service;
