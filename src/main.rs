mod cli;

use libscraper::config::{self, Config};
use libscraper::ledger::{SqlitePluginData, UnresolvedEntry, UnresolvedLedger};
use libscraper::passes::{self, ResolveOutcome, ScanOutcome};
use libscraper::scanner::DiscoveryOptions;
use libscraper::service::{
    ConfigSink, FileConfigSink, LibraryScraperPlugin, ManualResolverPlugin, NoopConfigSink,
    Plugin, Services,
};
use libscraper_db::pool::{init_pool, DbPool};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, LedgerAction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Loaded configuration and where it came from.
struct Loaded {
    config: Config,
    path: Option<PathBuf>,
}

fn load(config_path: Option<&Path>) -> Result<Loaded> {
    let path = config::find_config(config_path);
    let config = match path {
        Some(ref p) => config::load_config(p)?,
        None => {
            tracing::info!("No config file found, using defaults");
            Config::default()
        }
    };
    Ok(Loaded { config, path })
}

fn open_pool(loaded: &Loaded) -> Result<DbPool> {
    let db_path = config::database_path(&loaded.config, loaded.path.as_deref());
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }
    tracing::info!("Opening database at {}", db_path.display());
    Ok(init_pool(&db_path.to_string_lossy())?)
}

fn services(loaded: &Loaded) -> Result<Services> {
    let pool = open_pool(loaded)?;
    let sink: Arc<dyn ConfigSink> = match loaded.path {
        Some(ref p) => Arc::new(FileConfigSink::new(p)),
        None => Arc::new(NoopConfigSink),
    };
    Services::from_config(&loaded.config, pool, sink)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "libscraper=trace,libscraper_db=debug,libscraper_common=debug".to_string()
        } else {
            "libscraper=debug,libscraper_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Scan => scan(cli.config.as_deref()),
        Commands::Resolve { ids } => resolve(cli.config.as_deref(), ids),
        Commands::Ledger { action } => ledger(cli.config.as_deref(), action),
        Commands::Daemon => daemon(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("libscraper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn scan(config_path: Option<&Path>) -> Result<()> {
    let loaded = load(config_path)?;
    let services = services(&loaded)?;
    let options = DiscoveryOptions::from_config(&loaded.config.scraper, &loaded.config.library);

    let outcome = passes::run_automatic_pass(
        &options,
        &services.enricher,
        &services.ledger,
        &CancellationToken::new(),
    )?;

    match outcome {
        ScanOutcome::NoRoots => println!("No scan roots configured."),
        ScanOutcome::NothingToScan => println!("No directories found to scrape."),
        ScanOutcome::Cancelled => println!("Scan cancelled."),
        ScanOutcome::Completed(report) => {
            println!(
                "Scanned {} directories: {} scraped, {} unresolved",
                report.discovered,
                report.scraped,
                report.unresolved.len()
            );
            for entry in &report.unresolved {
                println!("  {}", entry.to_line());
            }
        }
    }

    Ok(())
}

fn resolve(config_path: Option<&Path>, ids: Option<String>) -> Result<()> {
    let loaded = load(config_path)?;
    let services = services(&loaded)?;
    let from_config = ids.is_none();
    let ids = ids.unwrap_or_else(|| loaded.config.manual.ids.clone());

    let outcome = passes::run_manual_pass(
        &ids,
        &services.enricher,
        &services.ledger,
        &CancellationToken::new(),
    )?;

    match outcome {
        ResolveOutcome::CountMismatch { entries, ids } => {
            anyhow::bail!("{ids} ids given for {entries} unresolved directories")
        }
        ResolveOutcome::NothingToDo => println!("No unresolved media."),
        ResolveOutcome::Cancelled => println!("Resolution cancelled."),
        ResolveOutcome::Completed(report) => {
            println!(
                "Resolved: {} scraped, {} skipped, {} invalid, {} not recognized",
                report.scraped, report.declined, report.invalid, report.unresolved
            );
            if from_config {
                services.config_sink.clear_manual_ids()?;
            }
        }
    }

    Ok(())
}

fn ledger(config_path: Option<&Path>, action: LedgerAction) -> Result<()> {
    let loaded = load(config_path)?;
    let ledger = UnresolvedLedger::new(Arc::new(SqlitePluginData::new(open_pool(&loaded)?)));

    match action {
        LedgerAction::Show => {
            let lines = ledger.lines()?;
            if lines.is_empty() {
                println!("No unresolved media.");
            }
            for (i, line) in lines.iter().enumerate() {
                match UnresolvedEntry::parse(line) {
                    Ok(entry) => println!(
                        "{:>3}. {} [{}]",
                        i + 1,
                        entry.path.display(),
                        entry.media_type().label()
                    ),
                    Err(_) => println!("{:>3}. {} [malformed]", i + 1, line),
                }
            }
        }
        LedgerAction::Clear => {
            if ledger.clear()? {
                println!("Unresolved ledger cleared.");
            } else {
                println!("No unresolved media.");
            }
        }
    }

    Ok(())
}

fn daemon(config_path: Option<&Path>) -> Result<()> {
    let loaded = load(config_path)?;
    let services = services(&loaded)?;

    let mut plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(LibraryScraperPlugin::new(loaded.config.clone(), services.clone())),
        Box::new(ManualResolverPlugin::new(loaded.config.clone(), services)),
    ];
    for plugin in plugins.iter_mut() {
        plugin.start()?;
    }
    tracing::info!("Libscraper daemon started");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(shutdown_signal());

    tracing::info!("Shutting down");
    for plugin in plugins.iter_mut() {
        plugin.stop();
    }
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            let roots = libscraper::scanner::rules::parse_roots(&config.scraper.scan_roots);
            println!("✓ Configuration is valid");
            println!("  Scheduled scan: {}", config.scraper.enabled);
            if config.scraper.enabled {
                println!("    Cron: {}", config.scraper.effective_cron());
            }
            println!("  Overwrite mode: {:?}", config.scraper.mode);
            println!("  Scan roots: {}", roots.len());
            for root in &roots {
                match root.forced {
                    Some(media_type) => {
                        println!("    {} [{}]", root.path.display(), media_type.label())
                    }
                    None => println!("    {}", root.path.display()),
                }
            }
            println!(
                "  Exclusions: {}",
                libscraper::scanner::rules::parse_exclusions(&config.scraper.exclude_roots).len()
            );
            println!("  Follow upstream titles: {}", config.library.follow_upstream);
            println!("  TMDB key configured: {}", !config.tmdb.api_key.is_empty());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Cron: {}", config.scraper.effective_cron());
            println!("  TMDB language: {}", config.tmdb.language);
        }
    }

    Ok(())
}
