//! Path utilities for exclusion checks and directory descriptors.
//!
//! These helpers are used by the scanner (exclusion rules) and by the
//! enrichment step when it builds the directory-shaped file item handed to
//! the scraper.

use std::path::Path;

/// Check whether `path` is equal to or nested under `base`.
///
/// The comparison is component-wise, so `/media/tv2` is *not* within
/// `/media/tv`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use libscraper_common::paths::is_within;
///
/// assert!(is_within(Path::new("/media/tv"), Path::new("/media/tv")));
/// assert!(is_within(Path::new("/media/tv/Show/Season 1"), Path::new("/media/tv")));
/// assert!(!is_within(Path::new("/media/tv2"), Path::new("/media/tv")));
/// ```
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Check whether `path` is within any of the given bases.
pub fn is_within_any<P: AsRef<Path>>(path: &Path, bases: &[P]) -> bool {
    bases.iter().any(|base| is_within(path, base.as_ref()))
}

/// Render a directory path in the form the scraper expects: forward slashes
/// and exactly one trailing `/`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use libscraper_common::paths::dir_item_path;
///
/// assert_eq!(dir_item_path(Path::new("/media/Movies/Foo (2020)")), "/media/Movies/Foo (2020)/");
/// assert_eq!(dir_item_path(Path::new("/media/Movies/")), "/media/Movies/");
/// ```
pub fn dir_item_path(path: &Path) -> String {
    let mut rendered = path.to_string_lossy().replace('\\', "/");
    while rendered.len() > 1 && rendered.ends_with('/') {
        rendered.pop();
    }
    if !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered
}

/// Final path component as a string, or an empty string for roots.
pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem as a string, or an empty string for roots.
pub fn dir_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
