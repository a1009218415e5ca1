use libscraper_common::{MediaType, OverwriteMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Crontab used when the automatic pass is enabled without an expression.
pub const DEFAULT_CRON: &str = "0 0 */7 * *";

const DEFAULT_MOVIE_RENAME_FORMAT: &str = "{{title}}{% if year %} ({{year}}){% endif %}/\
{{title}}{% if year %} ({{year}}){% endif %}{% if part %}-{{part}}{% endif %}\
{% if videoFormat %} - {{videoFormat}}{% endif %}{{fileExt}}";

const DEFAULT_TV_RENAME_FORMAT: &str = "{{title}}{% if year %} ({{year}}){% endif %}/\
Season {{season}}/{{title}} - {{season_episode}}{% if part %}-{{part}}{% endif %}\
{% if episode %} - 第 {{episode}} 集{% endif %}{{fileExt}}";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub manual: ManualConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Options of the automatic scan pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Register the recurring job
    #[serde(default)]
    pub enabled: bool,

    /// Run the pass once, shortly after start; cleared after scheduling
    #[serde(default)]
    pub run_once: bool,

    /// Five-field crontab; empty means weekly
    #[serde(default)]
    pub cron: String,

    #[serde(default)]
    pub mode: OverwriteMode,

    /// One root per line, optionally suffixed with `#电影` / `#电视剧`
    #[serde(default)]
    pub scan_roots: String,

    /// One excluded directory per line
    #[serde(default)]
    pub exclude_roots: String,
}

impl ScraperConfig {
    /// The cron expression to schedule, falling back to [`DEFAULT_CRON`].
    pub fn effective_cron(&self) -> &str {
        let cron = self.cron.trim();
        if cron.is_empty() {
            DEFAULT_CRON
        } else {
            cron
        }
    }
}

/// Options of the manual resolution pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManualConfig {
    /// Comma-separated TMDB ids, paired by position with ledger lines
    #[serde(default)]
    pub ids: String,
}

/// Library-wide settings shared with the host media manager.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_movie_rename_format")]
    pub movie_rename_format: String,

    #[serde(default = "default_tv_rename_format")]
    pub tv_rename_format: String,

    /// Keep titles in sync with TMDB; when false, titles recorded in the
    /// transfer history take precedence
    #[serde(default = "default_follow_upstream")]
    pub follow_upstream: bool,
}

fn default_movie_rename_format() -> String {
    DEFAULT_MOVIE_RENAME_FORMAT.to_string()
}

fn default_tv_rename_format() -> String {
    DEFAULT_TV_RENAME_FORMAT.to_string()
}

fn default_follow_upstream() -> bool {
    true
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            movie_rename_format: default_movie_rename_format(),
            tv_rename_format: default_tv_rename_format(),
            follow_upstream: default_follow_upstream(),
        }
    }
}

impl LibraryConfig {
    /// Number of directory levels the rename template for `media_type`
    /// produces. Anything that is not TV uses the movie template.
    pub fn rename_depth(&self, media_type: MediaType) -> usize {
        let format = match media_type {
            MediaType::Tv => &self.tv_rename_format,
            MediaType::Movie | MediaType::Unknown => &self.movie_rename_format,
        };
        format.split('/').count().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
}

fn default_language() -> String {
    "zh-CN".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `libscraper.db` next to the config file
    #[serde(default)]
    pub path: Option<PathBuf>,
}
