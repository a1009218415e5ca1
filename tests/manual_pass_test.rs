//! Integration tests for the manual resolution pass.

mod common;

use common::{movie, tv, ResolveCall, TestHarness};
use libscraper::ledger::UnresolvedEntry;
use libscraper::passes::{
    run_automatic_pass, run_manual_pass, ResolveOutcome, ResolveReport, ScanOutcome,
};
use libscraper_common::MediaType;
use tokio_util::sync::CancellationToken;

fn resolve(h: &TestHarness, ids: &str) -> ResolveOutcome {
    run_manual_pass(ids, &h.enricher(), &h.ledger, &CancellationToken::new()).unwrap()
}

fn seed(h: &TestHarness, entries: &[UnresolvedEntry]) {
    h.ledger.replace(entries).unwrap();
}

#[test]
fn count_mismatch_does_nothing() {
    let h = TestHarness::new();
    let entries: Vec<UnresolvedEntry> = ["A (2001)", "B (2002)", "C (2003)"]
        .iter()
        .map(|name| UnresolvedEntry::new(h.dir(name), MediaType::Movie))
        .collect();
    seed(&h, &entries);
    let before = h.ledger_lines();

    let outcome = resolve(&h, "1,2");

    assert_eq!(outcome, ResolveOutcome::CountMismatch { entries: 3, ids: 2 });
    assert!(h.resolver.calls().is_empty());
    assert!(h.scraper.calls().is_empty());
    assert_eq!(h.ledger_lines(), before);
}

#[test]
fn count_is_checked_before_emptiness() {
    let h = TestHarness::new();
    assert_eq!(
        resolve(&h, "603"),
        ResolveOutcome::CountMismatch { entries: 0, ids: 1 }
    );
    assert_eq!(resolve(&h, ""), ResolveOutcome::NothingToDo);
}

#[test]
fn ids_pair_with_lines_in_order_and_zero_skips() {
    let h = TestHarness::new();
    let matrix = h.dir("The Matrix");
    let other = h.dir("Something Else");
    seed(
        &h,
        &[
            UnresolvedEntry::new(&matrix, MediaType::Movie),
            UnresolvedEntry::new(&other, MediaType::Movie),
        ],
    );
    h.resolver.add(movie(603, "The Matrix"));

    let outcome = resolve(&h, "603,0");

    assert_eq!(
        outcome,
        ResolveOutcome::Completed(ResolveReport {
            scraped: 1,
            declined: 1,
            ..ResolveReport::default()
        })
    );
    assert_eq!(
        h.resolver.calls(),
        vec![ResolveCall::ById("603".into(), MediaType::Movie)]
    );
    assert_eq!(h.scraper.scraped_names(), vec!["The Matrix"]);
    assert!(h.ledger.load().unwrap().is_none());
}

#[test]
fn label_selects_the_lookup_type() {
    let h = TestHarness::new();
    let show = h.dir("Some Show");
    let unlabelled = h.dir("Mystery");
    h.write_ledger(&format!(
        "{}#电视剧\n{}#\n",
        show.display(),
        unlabelled.display()
    ));
    h.resolver.add(tv(1399, "Game of Thrones"));
    h.resolver.add(movie(550, "Fight Club"));

    let outcome = resolve(&h, "1399, 550");

    assert_matches::assert_matches!(outcome, ResolveOutcome::Completed(r) if r.scraped == 2);
    assert_eq!(
        h.resolver.calls(),
        vec![
            ResolveCall::ById("1399".into(), MediaType::Tv),
            ResolveCall::ById("550".into(), MediaType::Unknown),
        ]
    );
}

#[test]
fn malformed_lines_and_missing_paths_are_skipped() {
    let h = TestHarness::new();
    let real = h.dir("Real (2001)");
    let gone = h.path("Gone (2002)");
    h.write_ledger(&format!(
        "#电影\n{}#电影\n{}#电影\n",
        gone.display(),
        real.display()
    ));
    h.resolver.add(movie(5, "Real"));

    let outcome = resolve(&h, "1,2,5");

    assert_eq!(
        outcome,
        ResolveOutcome::Completed(ResolveReport {
            scraped: 1,
            invalid: 2,
            ..ResolveReport::default()
        })
    );
    assert_eq!(
        h.resolver.calls(),
        vec![ResolveCall::ById("5".into(), MediaType::Movie)]
    );
    assert!(h.ledger_lines().is_empty());
}

#[test]
fn unrecognized_id_is_skipped() {
    let h = TestHarness::new();
    let dir = h.dir("Nothing (2001)");
    seed(&h, &[UnresolvedEntry::new(&dir, MediaType::Movie)]);

    let outcome = resolve(&h, "999999");

    assert_eq!(
        outcome,
        ResolveOutcome::Completed(ResolveReport {
            unresolved: 1,
            ..ResolveReport::default()
        })
    );
    assert!(h.scraper.calls().is_empty());
    assert!(h.ledger_lines().is_empty());
}

#[test]
fn cancelled_pass_keeps_the_ledger() {
    let h = TestHarness::new();
    let dir = h.dir("Real (2001)");
    seed(&h, &[UnresolvedEntry::new(&dir, MediaType::Movie)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = run_manual_pass("5", &h.enricher(), &h.ledger, &cancel).unwrap();

    assert_eq!(outcome, ResolveOutcome::Cancelled);
    assert_eq!(h.ledger_lines().len(), 1);
    assert!(h.resolver.calls().is_empty());
}

#[test]
fn automatic_then_manual_resolves_everything() {
    let h = TestHarness::new();
    h.dir("movies/Inception (2010)");
    h.dir("movies/Lost Film (1999)");
    h.dir("movies/Obscure Film (1971)");
    h.resolver.add(movie(27205, "Inception"));
    h.resolver.add(movie(11, "Found At Last"));

    let scan = run_automatic_pass(
        &h.discovery(&["movies"], &[]),
        &h.enricher(),
        &h.ledger,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_matches::assert_matches!(scan, ScanOutcome::Completed(r) if r.unresolved.len() == 2);

    let outcome = resolve(&h, "11,0");

    assert_matches::assert_matches!(
        outcome,
        ResolveOutcome::Completed(r) if r.scraped == 1 && r.declined == 1
    );
    assert_eq!(
        h.scraper.scraped_names(),
        vec!["Inception (2010)", "Lost Film (1999)"]
    );
    assert_eq!(h.scraper.calls()[1].identity.title, "Found At Last");
    assert!(h.ledger.load().unwrap().is_none());
}

#[test]
fn hash_in_directory_names_survives_the_ledger() {
    let h = TestHarness::new();
    let show = h.dir("C#/Shows/Nobody Knows");
    let numbered = h.dir("C#/Shows/#1 Fan");
    h.resolver.add(tv(1, "Dare Mo Shiranai"));
    h.resolver.add(tv(2, "Number One Fan"));

    let scan = run_automatic_pass(
        &h.discovery(&["C#/Shows#电视剧"], &[]),
        &h.enricher(),
        &h.ledger,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_matches::assert_matches!(scan, ScanOutcome::Completed(r) if r.unresolved.len() == 2);
    assert_eq!(
        h.ledger_lines(),
        vec![
            format!("{}#电视剧", numbered.display()),
            format!("{}#电视剧", show.display()),
        ]
    );

    let outcome = resolve(&h, "2,1");

    assert_eq!(
        outcome,
        ResolveOutcome::Completed(ResolveReport {
            scraped: 2,
            ..ResolveReport::default()
        })
    );
    let calls = h.resolver.calls();
    assert_eq!(
        calls[calls.len() - 2..],
        [
            ResolveCall::ById("2".into(), MediaType::Tv),
            ResolveCall::ById("1".into(), MediaType::Tv),
        ]
    );
    assert!(h.ledger.load().unwrap().is_none());
}
