//! Library directory discovery.
//!
//! Walks the configured roots and turns every sub-directory into a
//! [`ScanTarget`], applying exclusions, forced or inferred media types, and
//! the rename-depth gate. Output order is root-list order, then sorted
//! enumeration order within each root; the unresolved ledger relies on it.

pub mod identifier;
pub mod nfo;
pub mod rules;

use libscraper_common::{paths::is_within_any, MediaType};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{LibraryConfig, ScraperConfig};

pub use identifier::{guess_from_path, NameGuess};
pub use rules::{PathRule, RootLabel, RootSpec};

/// A directory identified as a candidate media unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub path: PathBuf,
    pub media_type: MediaType,
}

/// Discovery stopped because cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("discovery cancelled")]
pub struct Cancelled;

/// Everything discovery needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub roots: Vec<PathRule>,
    pub exclusions: Vec<PathBuf>,
    pub movie_depth: usize,
    pub tv_depth: usize,
}

impl DiscoveryOptions {
    pub fn from_config(scraper: &ScraperConfig, library: &LibraryConfig) -> Self {
        Self {
            roots: rules::parse_roots(&scraper.scan_roots),
            exclusions: rules::parse_exclusions(&scraper.exclude_roots),
            movie_depth: library.rename_depth(MediaType::Movie),
            tv_depth: library.rename_depth(MediaType::Tv),
        }
    }

    fn rename_depth(&self, media_type: MediaType) -> usize {
        match media_type {
            MediaType::Tv => self.tv_depth,
            MediaType::Movie | MediaType::Unknown => self.movie_depth,
        }
    }
}

/// Discover scan targets under every root.
///
/// Missing roots are skipped with a warning. `cancel` is checked once per
/// enumerated directory; on cancellation nothing discovered so far is
/// returned.
pub fn discover(
    options: &DiscoveryOptions,
    cancel: &CancellationToken,
) -> Result<Vec<ScanTarget>, Cancelled> {
    let mut targets: Vec<ScanTarget> = Vec::new();
    let mut seen: HashSet<ScanTarget> = HashSet::new();

    for root in &options.roots {
        if !root.path.exists() {
            warn!("Scan root does not exist: {:?}", root.path);
            continue;
        }
        info!(root = %root.path.display(), forced = ?root.forced, "Scanning root");

        for dir in sub_directories(&root.path) {
            if cancel.is_cancelled() {
                info!("Library scan stopped");
                return Err(Cancelled);
            }

            if is_within_any(&dir, &options.exclusions) {
                debug!("{:?} is excluded, skipping", dir);
                continue;
            }

            let media_type = root
                .forced
                .unwrap_or_else(|| guess_from_path(&dir).media_type);

            if options.rename_depth(media_type) < 1 {
                continue;
            }

            let target = ScanTarget {
                path: dir,
                media_type,
            };
            if seen.insert(target.clone()) {
                debug!(
                    path = %target.path.display(),
                    media_type = %target.media_type,
                    "Found directory"
                );
                targets.push(target);
            }
        }
    }

    Ok(targets)
}

/// All directories below `root` (not including `root`), depth-first in
/// file-name order.
fn sub_directories(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(root_spec: &str, exclude: &str) -> DiscoveryOptions {
        let scraper = ScraperConfig {
            scan_roots: root_spec.to_string(),
            exclude_roots: exclude.to_string(),
            ..ScraperConfig::default()
        };
        DiscoveryOptions::from_config(&scraper, &LibraryConfig::default())
    }

    #[test]
    fn test_discovers_every_sub_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Movies");
        fs::create_dir_all(root.join("B (2001)/extras")).unwrap();
        fs::create_dir_all(root.join("A (2000)")).unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();

        let opts = options(&format!("{}#电影", root.display()), "");
        let targets = discover(&opts, &CancellationToken::new()).unwrap();

        let paths: Vec<_> = targets.iter().map(|t| t.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                root.join("A (2000)"),
                root.join("B (2001)"),
                root.join("B (2001)/extras"),
            ]
        );
        assert!(targets.iter().all(|t| t.media_type == MediaType::Movie));
    }

    #[test]
    fn test_exclusions_drop_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Movies");
        fs::create_dir_all(root.join("Keep (2000)")).unwrap();
        fs::create_dir_all(root.join("Trash/Old (1990)")).unwrap();

        let opts = options(
            &root.display().to_string(),
            &root.join("Trash").display().to_string(),
        );
        let targets = discover(&opts, &CancellationToken::new()).unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].path, root.join("Keep (2000)"));
    }

    #[test]
    fn test_type_inferred_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Mixed");
        fs::create_dir_all(root.join("Foo (2020)")).unwrap();
        fs::create_dir_all(root.join("Show/Season 1")).unwrap();

        let opts = options(&root.display().to_string(), "");
        let targets = discover(&opts, &CancellationToken::new()).unwrap();

        let find = |p: PathBuf| targets.iter().find(|t| t.path == p).unwrap().media_type;
        assert_eq!(find(root.join("Foo (2020)")), MediaType::Movie);
        assert_eq!(find(root.join("Show/Season 1")), MediaType::Tv);
        assert_eq!(find(root.join("Show")), MediaType::Unknown);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("TV");
        fs::create_dir_all(root.join("Show")).unwrap();

        let spec = format!("/does/not/exist\n{}#电视剧", root.display());
        let targets = discover(&options(&spec, ""), &CancellationToken::new()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].media_type, MediaType::Tv);
    }

    #[test]
    fn test_duplicate_roots_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Movies");
        fs::create_dir_all(root.join("Foo (2020)")).unwrap();

        let spec = format!("{0}#电影\n{0}#电影\n{0}#电视剧", root.display());
        let targets = discover(&options(&spec, ""), &CancellationToken::new()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].media_type, MediaType::Movie);
        assert_eq!(targets[1].media_type, MediaType::Tv);
    }

    #[test]
    fn test_flat_rename_format_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Movies");
        fs::create_dir_all(root.join("Foo (2020)")).unwrap();

        let scraper = ScraperConfig {
            scan_roots: format!("{}#电影", root.display()),
            ..ScraperConfig::default()
        };
        let library = LibraryConfig {
            movie_rename_format: "{{title}}{{fileExt}}".to_string(),
            ..LibraryConfig::default()
        };
        let opts = DiscoveryOptions::from_config(&scraper, &library);
        assert!(discover(&opts, &CancellationToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_discovery_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Movies");
        fs::create_dir_all(root.join("Foo (2020)")).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = discover(&options(&root.display().to_string(), ""), &cancel);
        assert_eq!(result, Err(Cancelled));
    }
}
