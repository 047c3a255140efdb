//! Poesy Loader main entry point
//!
//! This is the command-line interface for the Poesy Loader catalog crawler.

use anyhow::Context;
use clap::Parser;
use poesy_loader::config::{load_config_with_hash, Config};
use poesy_loader::crawler::run_crawl;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Poesy Loader: crawls a poem catalog into a CSV file
///
/// Every listing page of the catalog is visited in order, the poems it links
/// to are fetched and parsed, and each page's poems are appended to the output
/// before the next page starts. Rerunning appends after the existing rows.
#[derive(Parser, Debug)]
#[command(name = "poesy-loader")]
#[command(version)]
#[command(about = "Crawls a poem catalog into a CSV file", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "poesy_loader.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging may go to a file named in the config, so the config comes first
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, config.logging.file.as_deref())?;

    tracing::info!("<===================================================>");
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With no flags, `RUST_LOG` is honored if set. When `log_file` is given the
/// same events are also appended to it without colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("poesy_loader=info,warn")),
            1 => EnvFilter::new("poesy_loader=debug,info"),
            2 => EnvFilter::new("poesy_loader=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Catalog: {}", config.main.url);
    tracing::info!("Output file: {}", config.main.output_file);
    tracing::info!(
        "Fetch: max {} tries, {}ms backoff unit, {} concurrent",
        config.fetch.max_try,
        config.fetch.backoff_unit_ms,
        config.fetch.concurrency
    );

    match run_crawl(config).await {
        Ok(stats) => {
            stats.log_summary();
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
