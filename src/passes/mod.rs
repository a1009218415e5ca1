//! The two passes that share the enrichment pipeline.
//!
//! - [`automatic`] -- discover, resolve, scrape, record the unresolved.
//! - [`manual`] -- replay the unresolved ledger with user-supplied ids.

pub mod automatic;
pub mod manual;

pub use automatic::{run_automatic_pass, ScanOutcome, ScanReport};
pub use manual::{parse_ids, run_manual_pass, ResolveOutcome, ResolveReport};
