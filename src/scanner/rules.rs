//! Root and exclusion path specifications.
//!
//! Roots are configured one per line, each optionally annotated with a
//! media type label after `#`:
//!
//! ```text
//! /media/Movies#电影
//! /media/TV#电视剧
//! /media/Mixed
//! ```
//!
//! Exclusions are plain paths, one per line.

use libscraper_common::MediaType;
use std::path::PathBuf;

/// One configured root: the directory to walk and an optional forced type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pub path: PathBuf,
    pub forced: Option<MediaType>,
}

/// How the `#label` suffix of a root spec was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootLabel {
    /// No suffix, or an empty one.
    None,
    /// A label that maps to a media type.
    Known(MediaType),
    /// A label that maps to nothing; the type is inferred instead.
    Unrecognized(String),
}

/// A parsed root line, keeping the label interpretation for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSpec {
    pub rule: PathRule,
    pub label: RootLabel,
}

/// Parse a single root spec line. Returns `None` for blank lines.
///
/// The label is split at the last `#`, so paths containing `#` still work
/// when annotated.
pub fn parse_root_spec(line: &str) -> Option<RootSpec> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (path, label) = match line.rsplit_once('#') {
        Some((path, label)) => {
            let label = label.trim();
            let parsed = if label.is_empty() {
                RootLabel::None
            } else {
                match MediaType::from_label(label) {
                    Some(media_type) => RootLabel::Known(media_type),
                    None => RootLabel::Unrecognized(label.to_string()),
                }
            };
            (path.trim(), parsed)
        }
        None => (line, RootLabel::None),
    };

    if path.is_empty() {
        return None;
    }

    let forced = match label {
        RootLabel::Known(media_type) => Some(media_type),
        _ => None,
    };

    Some(RootSpec {
        rule: PathRule {
            path: PathBuf::from(path),
            forced,
        },
        label,
    })
}

/// Parse newline-delimited root specs, in order.
pub fn parse_root_specs(text: &str) -> Vec<RootSpec> {
    text.lines().filter_map(parse_root_spec).collect()
}

/// Parse newline-delimited root specs into path rules.
pub fn parse_roots(text: &str) -> Vec<PathRule> {
    parse_root_specs(text).into_iter().map(|s| s.rule).collect()
}

/// Parse newline-delimited exclusion paths.
pub fn parse_exclusions(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect()
}
