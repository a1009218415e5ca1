use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "libscraper")]
#[command(author, version, about = "Media library scraper")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the configured roots once and scrape what can be resolved
    Scan,

    /// Resolve the unresolved ledger with explicit TMDB ids
    Resolve {
        /// Comma-separated TMDB ids, one per ledger line; 0 skips a line
        /// (defaults to [manual] ids from the config)
        #[arg(long)]
        ids: Option<String>,
    },

    /// Inspect or clear the unresolved ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Run scheduled scans until interrupted
    Daemon,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Print unresolved directories, numbered in pairing order
    Show,
    /// Delete the ledger
    Clear,
}
