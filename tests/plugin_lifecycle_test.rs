//! Integration tests for plugin start/stop and job registration.

mod common;

use std::time::{Duration, Instant};

use common::{movie, TestHarness};
use libscraper::config::Config;
use libscraper::ledger::UnresolvedEntry;
use libscraper::service::{
    LibraryScraperPlugin, ManualResolverPlugin, Plugin, RESOLVE_JOB_ID, SCAN_JOB_ID,
};
use libscraper_common::MediaType;

/// Poll `done` until it holds or the deadline passes.
fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(15);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    done()
}

fn scan_config(h: &TestHarness) -> Config {
    let mut config = Config::default();
    config.scraper.scan_roots = h.root_line("movies");
    config
}

// ---------------------------------------------------------------------------
// Library scraper
// ---------------------------------------------------------------------------

#[test]
fn disabled_plugin_registers_nothing() {
    let h = TestHarness::new();
    let mut plugin = LibraryScraperPlugin::new(scan_config(&h), h.services());

    plugin.start().unwrap();

    assert!(plugin.job_ids().is_empty());
    assert_eq!(*h.sink.run_once_cleared.lock(), 0);
}

#[test]
fn enabled_plugin_registers_cron_job() {
    let h = TestHarness::new();
    let mut config = scan_config(&h);
    config.scraper.enabled = true;
    config.scraper.cron = "30 2 * * *".to_string();
    let mut plugin = LibraryScraperPlugin::new(config, h.services());

    plugin.start().unwrap();
    assert_eq!(plugin.job_ids(), vec![SCAN_JOB_ID.to_string()]);

    // Restarting replaces the job rather than adding a second one.
    plugin.start().unwrap();
    assert_eq!(plugin.job_ids(), vec![SCAN_JOB_ID.to_string()]);

    plugin.stop();
    assert!(plugin.job_ids().is_empty());
}

#[test]
fn invalid_cron_fails_to_start() {
    let h = TestHarness::new();
    let mut config = scan_config(&h);
    config.scraper.enabled = true;
    config.scraper.cron = "not a cron".to_string();
    let mut plugin = LibraryScraperPlugin::new(config, h.services());

    assert!(plugin.start().is_err());
    assert!(plugin.job_ids().is_empty());
}

#[test]
fn run_once_scans_and_is_reset() {
    let h = TestHarness::new();
    h.dir("movies/Inception (2010)");
    h.resolver.add(movie(27205, "Inception"));
    let mut config = scan_config(&h);
    config.scraper.run_once = true;
    let mut plugin = LibraryScraperPlugin::new(config, h.services());

    plugin.start().unwrap();
    assert_eq!(*h.sink.run_once_cleared.lock(), 1);

    assert!(wait_for(|| !h.scraper.calls().is_empty()));
    assert_eq!(h.scraper.scraped_names(), vec!["Inception (2010)"]);

    // The flag was consumed; a restart does not schedule another run.
    plugin.start().unwrap();
    assert!(plugin.job_ids().is_empty());
    assert_eq!(*h.sink.run_once_cleared.lock(), 1);
}

#[test]
fn stop_cancels_a_pending_run_once() {
    let h = TestHarness::new();
    h.dir("movies/Inception (2010)");
    h.resolver.add(movie(27205, "Inception"));
    let mut config = scan_config(&h);
    config.scraper.run_once = true;
    let mut plugin = LibraryScraperPlugin::new(config, h.services());

    plugin.start().unwrap();
    plugin.stop();
    std::thread::sleep(Duration::from_millis(100));

    assert!(plugin.job_ids().is_empty());
    assert!(h.scraper.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Manual resolver
// ---------------------------------------------------------------------------

#[test]
fn empty_ids_register_nothing() {
    let h = TestHarness::new();
    let mut plugin = ManualResolverPlugin::new(Config::default(), h.services());

    plugin.start().unwrap();

    assert!(plugin.job_ids().is_empty());
}

#[test]
fn configured_ids_resolve_and_are_cleared() {
    let h = TestHarness::new();
    let dir = h.dir("The Matrix");
    h.ledger
        .replace(&[UnresolvedEntry::new(&dir, MediaType::Movie)])
        .unwrap();
    h.resolver.add(movie(603, "The Matrix"));
    let mut config = Config::default();
    config.manual.ids = "603".to_string();
    let mut plugin = ManualResolverPlugin::new(config, h.services());

    plugin.start().unwrap();
    assert_eq!(plugin.job_ids(), vec![RESOLVE_JOB_ID.to_string()]);

    assert!(wait_for(|| *h.sink.ids_cleared.lock() == 1));
    assert_eq!(h.scraper.scraped_names(), vec!["The Matrix"]);
    assert!(h.ledger_lines().is_empty());

    // Ids are consumed; a restart registers nothing.
    plugin.start().unwrap();
    assert!(plugin.job_ids().is_empty());
}

#[test]
fn mismatched_ids_keep_ledger_and_ids() {
    let h = TestHarness::new();
    let dir = h.dir("The Matrix");
    h.ledger
        .replace(&[UnresolvedEntry::new(&dir, MediaType::Movie)])
        .unwrap();
    let mut config = Config::default();
    config.manual.ids = "603,604".to_string();
    let mut plugin = ManualResolverPlugin::new(config, h.services());

    plugin.start().unwrap();
    assert!(wait_for(|| plugin.job_ids().is_empty()));

    assert_eq!(*h.sink.ids_cleared.lock(), 0);
    assert_eq!(h.ledger_lines().len(), 1);
    assert!(h.resolver.calls().is_empty());
}
