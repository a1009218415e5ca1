//! Manual resolution pass.
//!
//! Pairs each ledger line, by position, with a user-supplied TMDB id and
//! scrapes the pair. An id of `0` skips its line. When every pair has been
//! visited the ledger is deleted.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ledger::{UnresolvedEntry, UnresolvedLedger};
use crate::metadata::Enricher;

/// Token that declines to resolve its ledger line.
pub const SKIP_TOKEN: &str = "0";

/// Summary of a completed manual pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub scraped: usize,
    /// Pairs skipped with a `0` id.
    pub declined: usize,
    /// Malformed lines and paths that no longer exist.
    pub invalid: usize,
    /// Ids the resolver did not recognize.
    pub unresolved: usize,
}

/// How a manual pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Ledger and id counts differ; nothing was done.
    CountMismatch { entries: usize, ids: usize },
    /// The ledger is empty.
    NothingToDo,
    /// Stopped between pairs; the ledger is kept.
    Cancelled,
    Completed(ResolveReport),
}

/// Split a comma-delimited id list into its non-empty tokens.
pub fn parse_ids(ids: &str) -> Vec<&str> {
    ids.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Run the manual pass with `ids` against the stored ledger.
pub fn run_manual_pass(
    ids: &str,
    enricher: &Enricher,
    ledger: &UnresolvedLedger,
    cancel: &CancellationToken,
) -> Result<ResolveOutcome> {
    let lines = ledger.lines().context("Failed to load unresolved ledger")?;
    let ids = parse_ids(ids);
    info!(entries = lines.len(), ids = ids.len(), "Loaded unresolved ledger");

    if lines.len() != ids.len() {
        warn!(
            entries = lines.len(),
            ids = ids.len(),
            "Id count does not match unresolved directory count"
        );
        return Ok(ResolveOutcome::CountMismatch {
            entries: lines.len(),
            ids: ids.len(),
        });
    }

    if lines.is_empty() {
        info!("No directories to resolve");
        return Ok(ResolveOutcome::NothingToDo);
    }

    let mut report = ResolveReport::default();
    for (line, &tmdb_id) in lines.iter().zip(&ids) {
        if cancel.is_cancelled() {
            info!("Manual resolution stopped");
            return Ok(ResolveOutcome::Cancelled);
        }

        let entry = match UnresolvedEntry::parse(line) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("{}", e);
                report.invalid += 1;
                continue;
            }
        };

        if !entry.path.exists() {
            warn!("Path does not exist: {:?}", entry.path);
            report.invalid += 1;
            continue;
        }

        if tmdb_id.is_empty() || tmdb_id == SKIP_TOKEN {
            info!(path = %entry.path.display(), "Skipped by request");
            report.declined += 1;
            continue;
        }

        let media_type = entry.media_type();
        info!(
            path = %entry.path.display(),
            media_type = %media_type,
            tmdb_id = tmdb_id,
            "Resolving directory"
        );

        let Some(identity) = enricher
            .resolve_by_id(tmdb_id, media_type)
            .with_context(|| format!("Failed to resolve tmdbid {tmdb_id}"))?
        else {
            warn!(path = %entry.path.display(), tmdb_id = tmdb_id, "TMDB id not recognized");
            report.unresolved += 1;
            continue;
        };

        enricher
            .enrich(&entry.path, identity)
            .with_context(|| format!("Failed to scrape {:?}", entry.path))?;
        report.scraped += 1;
    }

    ledger.clear().context("Failed to delete unresolved ledger")?;
    info!(
        scraped = report.scraped,
        declined = report.declined,
        invalid = report.invalid,
        unresolved = report.unresolved,
        "Manual resolution complete"
    );

    Ok(ResolveOutcome::Completed(report))
}
