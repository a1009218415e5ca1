//! Media identification from directory names.
//!
//! Library directories follow loose conventions (`Title (Year)`,
//! `Show/Season 1`, `Show.S01.1080p`), so a handful of patterns recover a
//! searchable title, a year, and a likely media type.

use libscraper_common::MediaType;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Best-effort guess derived from a directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGuess {
    /// Cleaned title ready for a metadata search.
    pub title: String,
    /// Year if detected.
    pub year: Option<u16>,
    /// Season number, for season folders and `Sxx` tokens.
    pub season: Option<u16>,
    /// Detected media type.
    pub media_type: MediaType,
}

struct Patterns {
    season_folder: Regex,
    chinese_season: Regex,
    season_token: Regex,
    year: Regex,
    brackets: Regex,
    release_tokens: Regex,
    separators: Regex,
    spaces: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        season_folder: Regex::new(r"(?i)^(?:season[\s._-]*(\d{1,3})|s(\d{1,3})|specials?)$")
            .expect("valid regex"),
        chinese_season: Regex::new(r"^第\s*(\d{1,3})\s*季$").expect("valid regex"),
        season_token: Regex::new(r"(?i)(?:^|[\s._\-\[(])s(\d{1,3})(?:e\d{1,4})?(?:$|[\s._\-\])])")
            .expect("valid regex"),
        year: Regex::new(r"(?:^|[\s._\-\[(])((?:19|20)\d{2})(?:$|[\s._\-\])])")
            .expect("valid regex"),
        brackets: Regex::new(r"\[[^\]]*\]|【[^】]*】").expect("valid regex"),
        release_tokens: Regex::new(
            r"(?i)[\s._-](?:2160p|1080p|1080i|720p|480p|4k|uhd|bluray|blu-ray|web-?dl|webrip|hdtv|remux|x26[45]|h\.?26[45]|hevc|complete)(?:[\s._-].*)?$",
        )
        .expect("valid regex"),
        separators: Regex::new(r"[._]").expect("valid regex"),
        spaces: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Guess title, year and media type for a library directory.
///
/// Season folders (`Season 1`, `S01`, `第1季`, `Specials`) take their title
/// from the parent directory and are always TV.
pub fn guess_from_path(path: &Path) -> NameGuess {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(season) = season_folder_number(&name) {
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut guess = guess_from_name(&parent);
        guess.media_type = MediaType::Tv;
        guess.season = Some(season);
        return guess;
    }

    guess_from_name(&name)
}

/// Guess title, year and media type from a single directory name.
pub fn guess_from_name(name: &str) -> NameGuess {
    let p = patterns();

    let without_brackets = p.brackets.replace_all(name, " ");
    let season = p
        .season_token
        .captures(&without_brackets)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());

    let year_match = p.year.captures_iter(&without_brackets).last();
    let year = year_match
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());

    // The title ends at the first season token or at the year.
    let mut cut = without_brackets.len();
    if let Some(m) = p.season_token.find(&without_brackets) {
        cut = cut.min(m.start());
    }
    if let Some(m) = year_match.as_ref().and_then(|c| c.get(0)) {
        if m.start() > 0 {
            cut = cut.min(m.start());
        }
    }
    let head = &without_brackets[..cut];
    let head = p.release_tokens.replace(head, "");
    let title = clean_title(&head);

    let media_type = if season.is_some() {
        MediaType::Tv
    } else if year.is_some() {
        MediaType::Movie
    } else {
        MediaType::Unknown
    };

    NameGuess {
        title,
        year,
        season,
        media_type,
    }
}

/// Season number for a season folder name; `Specials` is season 0.
fn season_folder_number(name: &str) -> Option<u16> {
    let p = patterns();
    let name = name.trim();
    if let Some(caps) = p.season_folder.captures(name) {
        return Some(
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
        );
    }
    p.chinese_season
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn clean_title(raw: &str) -> String {
    let p = patterns();
    let spaced = p.separators.replace_all(raw, " ");
    let trimmed = spaced.trim_matches(|c: char| c.is_whitespace() || "-([".contains(c));
    p.spaces.replace_all(trimmed, " ").into_owned()
}
