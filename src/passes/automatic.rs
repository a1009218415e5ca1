//! Automatic scan pass.
//!
//! Discover targets, resolve each one from its NFO or its name, scrape the
//! resolved ones, and replace the unresolved ledger with everything that
//! could not be resolved, in discovery order.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ledger::{UnresolvedEntry, UnresolvedLedger};
use crate::metadata::Enricher;
use crate::scanner::{discover, Cancelled, DiscoveryOptions};

/// Summary of a completed automatic pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub discovered: usize,
    pub scraped: usize,
    /// Targets that could not be resolved, as written to the ledger.
    pub unresolved: Vec<UnresolvedEntry>,
}

/// How an automatic pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No scan roots are configured.
    NoRoots,
    /// Discovery found no directories; the ledger was left alone.
    NothingToScan,
    /// Cancelled before the ledger was written. Targets already scraped
    /// stay scraped.
    Cancelled,
    Completed(ScanReport),
}

/// Run the automatic pass.
///
/// Errors from the resolver, image fetcher or scraper abort the remaining
/// targets and leave the ledger untouched. `cancel` is observed per
/// discovered directory and again before each target is resolved.
pub fn run_automatic_pass(
    options: &DiscoveryOptions,
    enricher: &Enricher,
    ledger: &UnresolvedLedger,
    cancel: &CancellationToken,
) -> Result<ScanOutcome> {
    if options.roots.is_empty() {
        return Ok(ScanOutcome::NoRoots);
    }

    let targets = match discover(options, cancel) {
        Ok(targets) => targets,
        Err(Cancelled) => return Ok(ScanOutcome::Cancelled),
    };

    if targets.is_empty() {
        info!("No directories found to scrape");
        return Ok(ScanOutcome::NothingToScan);
    }

    let mut report = ScanReport {
        discovered: targets.len(),
        ..ScanReport::default()
    };

    for target in &targets {
        if cancel.is_cancelled() {
            info!("Library scan stopped");
            return Ok(ScanOutcome::Cancelled);
        }

        info!(path = %target.path.display(), media_type = %target.media_type, "Scraping directory");

        let Some(identity) = enricher
            .resolve(target)
            .with_context(|| format!("Failed to resolve {:?}", target.path))?
        else {
            warn!(
                path = %target.path.display(),
                "No media info recognized; recorded for manual resolution"
            );
            report
                .unresolved
                .push(UnresolvedEntry::new(target.path.clone(), target.media_type));
            continue;
        };

        enricher
            .enrich(&target.path, identity)
            .with_context(|| format!("Failed to scrape {:?}", target.path))?;
        report.scraped += 1;
    }

    ledger
        .replace(&report.unresolved)
        .context("Failed to save unresolved ledger")?;
    info!(
        discovered = report.discovered,
        scraped = report.scraped,
        unresolved = report.unresolved.len(),
        "Library scan complete"
    );

    Ok(ScanOutcome::Completed(report))
}
