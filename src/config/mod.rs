pub mod persist;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use libscraper_common::MediaType;
use std::path::{Path, PathBuf};

use crate::scanner::rules::{parse_root_specs, RootLabel};
use crate::service::schedule::parse_cron;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Locate the config file: the explicit path, or the first default
/// location that exists.
pub fn find_config(custom_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom_path {
        return Some(path.to_path_buf());
    }

    let default_paths = [
        "./libscraper.toml",
        "./config.toml",
        "~/.config/libscraper/config.toml",
        "/etc/libscraper/config.toml",
    ];

    default_paths
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Where the SQLite database lives: the configured path, or
/// `libscraper.db` next to the config file (current directory otherwise).
pub fn database_path(config: &Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(ref path) = config.database.path {
        return PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    }
    config_path
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join("libscraper.db")
}

/// Validate configuration
///
/// Hard errors are limited to values that would make scheduling impossible;
/// questionable path specs only produce warnings.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.scraper.enabled {
        parse_cron(config.scraper.effective_cron()).with_context(|| {
            format!("Invalid cron expression: {:?}", config.scraper.effective_cron())
        })?;
    }

    for spec in parse_root_specs(&config.scraper.scan_roots) {
        if let RootLabel::Unrecognized(ref label) = spec.label {
            tracing::warn!(
                path = %spec.rule.path.display(),
                label = %label,
                "Unknown media type label on scan root; type will be inferred"
            );
        }
        if !spec.rule.path.exists() {
            tracing::warn!("Scan root does not exist: {:?}", spec.rule.path);
        }
    }

    if config.library.rename_depth(MediaType::Movie) < 1
        || config.library.rename_depth(MediaType::Tv) < 1
    {
        tracing::warn!(
            "Rename format without a directory level; matching directories will be skipped"
        );
    }

    Ok(())
}
