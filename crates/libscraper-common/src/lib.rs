//! Libscraper-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across libscraper:
//!
//! - **Core Types**: media type enum with its persisted labels, overwrite mode
//! - **Path Utilities**: ancestry checks and directory descriptor paths
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use libscraper_common::{MediaType, Error, Result};
//! use libscraper_common::paths::is_within;
//! use std::path::Path;
//!
//! // Labels are the persisted form of a media type
//! assert_eq!(MediaType::from_label("电视剧"), Some(MediaType::Tv));
//!
//! // Exclusion checks are component-wise
//! assert!(is_within(Path::new("/media/tv/show"), Path::new("/media/tv")));
//!
//! // Unknown overwrite modes are rejected
//! let mode: Result<libscraper_common::OverwriteMode> = "force".parse();
//! assert!(matches!(mode, Err(Error::UnknownMode(_))));
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
