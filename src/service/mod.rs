//! Plugin lifecycle: configuration, job registration, shutdown.
//!
//! Two plugins share one [`Services`] bundle:
//!
//! - [`LibraryScraperPlugin`] schedules the automatic pass (cron and/or
//!   run-once).
//! - [`ManualResolverPlugin`] runs the manual pass once whenever ids are
//!   configured.
//!
//! Each plugin owns its own [`Scheduler`], so starting one never touches the
//! other's jobs, and each `start` removes the plugin's previous jobs first.

pub mod schedule;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use libscraper_db::pool::DbPool;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::ledger::{SqlitePluginData, UnresolvedLedger};
use crate::metadata::{DbHistory, EnrichOptions, Enricher, LocalScraper, TmdbProvider};
use crate::passes::{run_automatic_pass, run_manual_pass, ResolveOutcome, ScanOutcome};
use crate::scanner::DiscoveryOptions;

pub use schedule::{parse_cron, Scheduler, Trigger};

/// Job id of the automatic pass.
pub const SCAN_JOB_ID: &str = "LibraryScraperLin";
/// Job id of the manual pass.
pub const RESOLVE_JOB_ID: &str = "UnscrapFile";
/// Delay before a run-once job fires.
pub const RUN_ONCE_DELAY: Duration = Duration::from_secs(3);

/// Host-facing lifecycle of a plugin.
pub trait Plugin {
    /// Replace the plugin's configuration. Takes effect on the next `start`.
    fn configure(&mut self, config: Config);
    /// Remove previously registered jobs and register new ones.
    fn start(&mut self) -> Result<()>;
    /// Cancel and remove all jobs.
    fn stop(&mut self);
}

/// Where one-shot settings are reset after they have been consumed.
pub trait ConfigSink: Send + Sync {
    fn clear_run_once(&self) -> Result<()>;
    fn clear_manual_ids(&self) -> Result<()>;
}

/// [`ConfigSink`] that rewrites the config file in place.
pub struct FileConfigSink {
    path: PathBuf,
}

impl FileConfigSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSink for FileConfigSink {
    fn clear_run_once(&self) -> Result<()> {
        config::persist::clear_run_once(&self.path)
    }

    fn clear_manual_ids(&self) -> Result<()> {
        config::persist::clear_manual_ids(&self.path)
    }
}

/// [`ConfigSink`] for hosts without a config file.
pub struct NoopConfigSink;

impl ConfigSink for NoopConfigSink {
    fn clear_run_once(&self) -> Result<()> {
        Ok(())
    }

    fn clear_manual_ids(&self) -> Result<()> {
        Ok(())
    }
}

/// Collaborators shared by both plugins.
#[derive(Clone)]
pub struct Services {
    pub enricher: Enricher,
    pub ledger: UnresolvedLedger,
    pub config_sink: Arc<dyn ConfigSink>,
}

impl Services {
    /// Wire the production delegates: TMDB for identities and artwork, the
    /// local NFO writer, and the database for history and the ledger.
    pub fn from_config(
        config: &Config,
        pool: DbPool,
        config_sink: Arc<dyn ConfigSink>,
    ) -> Result<Self> {
        let tmdb = Arc::new(TmdbProvider::from_config(&config.tmdb)?);
        if !tmdb.is_available() {
            warn!("No TMDB api_key configured; identity resolution will fail");
        }

        let enricher = Enricher::new(
            tmdb.clone(),
            tmdb,
            Arc::new(LocalScraper::new()?),
            Arc::new(DbHistory::new(pool.clone())),
            EnrichOptions {
                mode: config.scraper.mode,
                follow_upstream: config.library.follow_upstream,
            },
        );

        Ok(Self {
            enricher,
            ledger: UnresolvedLedger::new(Arc::new(SqlitePluginData::new(pool))),
            config_sink,
        })
    }

    /// The enricher, reconfigured for `config`.
    pub fn enricher_for(&self, config: &Config) -> Enricher {
        self.enricher.with_options(EnrichOptions {
            mode: config.scraper.mode,
            follow_upstream: config.library.follow_upstream,
        })
    }
}

/// Schedules the automatic scan pass.
pub struct LibraryScraperPlugin {
    config: Config,
    services: Services,
    scheduler: Scheduler,
}

impl LibraryScraperPlugin {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config,
            services,
            scheduler: Scheduler::new(),
        }
    }

    /// Ids of currently registered jobs.
    pub fn job_ids(&self) -> Vec<String> {
        self.scheduler.job_ids()
    }

    fn add_scan_job(&self, id: &str, trigger: Trigger) -> Result<()> {
        let options =
            DiscoveryOptions::from_config(&self.config.scraper, &self.config.library);
        let enricher = self.services.enricher_for(&self.config);
        let ledger = self.services.ledger.clone();

        self.scheduler.add_job(id, trigger, move |cancel| {
            match run_automatic_pass(&options, &enricher, &ledger, cancel)? {
                ScanOutcome::NoRoots => info!("No scan roots configured"),
                ScanOutcome::NothingToScan => info!("Nothing to scan"),
                ScanOutcome::Cancelled => info!("Library scan cancelled"),
                ScanOutcome::Completed(report) => info!(
                    scraped = report.scraped,
                    unresolved = report.unresolved.len(),
                    "Library scan finished"
                ),
            }
            Ok(())
        })
    }
}

impl Plugin for LibraryScraperPlugin {
    fn configure(&mut self, config: Config) {
        self.config = config;
    }

    fn start(&mut self) -> Result<()> {
        self.stop();

        if self.config.scraper.run_once {
            info!("Library scan will run once shortly");
            self.add_scan_job(&format!("{SCAN_JOB_ID}-once"), Trigger::once_after(RUN_ONCE_DELAY))?;
            self.config.scraper.run_once = false;
            if let Err(e) = self.services.config_sink.clear_run_once() {
                warn!(error = %e, "Failed to reset run_once");
            }
        }

        if self.config.scraper.enabled {
            let cron = self.config.scraper.effective_cron().to_string();
            let trigger = Trigger::cron(&cron)?;
            self.add_scan_job(SCAN_JOB_ID, trigger)?;
            info!(cron = %cron, "Library scan scheduled");
        }

        Ok(())
    }

    fn stop(&mut self) {
        self.scheduler.remove_all_jobs();
    }
}

/// Runs the manual resolution pass once per configured id list.
pub struct ManualResolverPlugin {
    config: Config,
    services: Services,
    scheduler: Scheduler,
}

impl ManualResolverPlugin {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config,
            services,
            scheduler: Scheduler::new(),
        }
    }

    /// Ids of currently registered jobs.
    pub fn job_ids(&self) -> Vec<String> {
        self.scheduler.job_ids()
    }
}

impl Plugin for ManualResolverPlugin {
    fn configure(&mut self, config: Config) {
        self.config = config;
    }

    fn start(&mut self) -> Result<()> {
        self.stop();

        let ids = self.config.manual.ids.trim().to_string();
        if ids.is_empty() {
            return Ok(());
        }

        let enricher = self.services.enricher_for(&self.config);
        let ledger = self.services.ledger.clone();
        let sink = self.services.config_sink.clone();

        self.scheduler.add_job(
            RESOLVE_JOB_ID,
            Trigger::once_after(RUN_ONCE_DELAY),
            move |cancel| {
                match run_manual_pass(&ids, &enricher, &ledger, cancel)? {
                    ResolveOutcome::Completed(report) => {
                        info!(scraped = report.scraped, "Manual resolution finished");
                        sink.clear_manual_ids()?;
                    }
                    ResolveOutcome::CountMismatch { entries, ids } => warn!(
                        entries,
                        ids, "Manual resolution aborted: id count mismatch"
                    ),
                    ResolveOutcome::NothingToDo => info!("Nothing to resolve"),
                    ResolveOutcome::Cancelled => info!("Manual resolution cancelled"),
                }
                Ok(())
            },
        )?;
        info!("Manual resolution will run shortly");
        self.config.manual.ids.clear();

        Ok(())
    }

    fn stop(&mut self) {
        self.scheduler.remove_all_jobs();
    }
}
