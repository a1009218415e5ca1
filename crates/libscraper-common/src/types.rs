//! Core type definitions shared by the scanner, the ledger, and the database.
//!
//! Media types carry two spellings: a lowercase serde form used in JSON and
//! config files, and a *label* used in every persisted text record (ledger
//! lines, history rows, root-path annotations).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Label persisted for [`MediaType::Movie`].
pub const MOVIE_LABEL: &str = "电影";
/// Label persisted for [`MediaType::Tv`].
pub const TV_LABEL: &str = "电视剧";
/// Label persisted for [`MediaType::Unknown`].
pub const UNKNOWN_LABEL: &str = "未知";

/// Free-text annotations accepted after `#` in a path spec.
///
/// Matching is exact for the native labels and ASCII case-insensitive for
/// the aliases. `未知` is deliberately absent: an "unknown" annotation means
/// the type is not forced.
const LABEL_TABLE: &[(&str, MediaType)] = &[
    (MOVIE_LABEL, MediaType::Movie),
    (TV_LABEL, MediaType::Tv),
    ("movie", MediaType::Movie),
    ("movies", MediaType::Movie),
    ("film", MediaType::Movie),
    ("tv", MediaType::Tv),
    ("tvshow", MediaType::Tv),
    ("tvshows", MediaType::Tv),
    ("series", MediaType::Tv),
    ("show", MediaType::Tv),
];

/// Kind of media unit a directory represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A single film.
    Movie,
    /// A TV show or one of its seasons.
    Tv,
    /// Name heuristics could not decide.
    Unknown,
}

impl MediaType {
    /// The persisted label for this type.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movie => MOVIE_LABEL,
            Self::Tv => TV_LABEL,
            Self::Unknown => UNKNOWN_LABEL,
        }
    }

    /// Map a path annotation to a forced media type.
    ///
    /// Returns `None` for empty, unknown, or `未知` labels so that the caller
    /// falls back to inference instead of failing.
    ///
    /// ```
    /// use libscraper_common::MediaType;
    ///
    /// assert_eq!(MediaType::from_label("电影"), Some(MediaType::Movie));
    /// assert_eq!(MediaType::from_label("TV"), Some(MediaType::Tv));
    /// assert_eq!(MediaType::from_label("未知"), None);
    /// assert_eq!(MediaType::from_label("documentary"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        LABEL_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == label || candidate.eq_ignore_ascii_case(label))
            .map(|(_, media_type)| *media_type)
    }

    /// Parse a label as it appears in a persisted record.
    ///
    /// Unlike [`from_label`](Self::from_label) this also recognizes the
    /// `未知` label, so history rows round-trip.
    pub fn from_record_label(label: &str) -> Option<Self> {
        if label.trim() == UNKNOWN_LABEL {
            return Some(Self::Unknown);
        }
        Self::from_label(label)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Tv => write!(f, "tv"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// How enrichment treats metadata and artwork that already exist on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverwriteMode {
    /// Keep existing metadata files and images.
    #[default]
    #[serde(rename = "")]
    KeepExisting,
    /// Overwrite all metadata files and images.
    #[serde(rename = "force_all")]
    ForceAll,
}

impl OverwriteMode {
    /// Whether the scrape call should overwrite existing files.
    pub fn overwrite(&self) -> bool {
        matches!(self, Self::ForceAll)
    }

    /// The configuration string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepExisting => "",
            Self::ForceAll => "force_all",
        }
    }
}

impl FromStr for OverwriteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::KeepExisting),
            "force_all" => Ok(Self::ForceAll),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for OverwriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepExisting => write!(f, "keep_existing"),
            Self::ForceAll => write!(f, "force_all"),
        }
    }
}
