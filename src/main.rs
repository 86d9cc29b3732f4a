//! Trawl main entry point
//!
//! This is the command-line interface for the Trawl crawler and indexer.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use trawl::config::{load_config_with_hash, Config};
use trawl::output::{load_statistics, print_statistics};
use trawl::shutdown::{self, ShutdownSignal};
use trawl::storage::open_storage;
use tracing_subscriber::EnvFilter;

/// Trawl: a resumable web crawler and keyword indexer
///
/// The crawler follows external links breadth-first from the configured
/// seeds. The indexer extracts the top keywords of every crawled page into
/// an inverted index. Interrupt either with Ctrl+C and run it again to
/// resume.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version)]
#[command(about = "A resumable web crawler and keyword indexer", long_about = None)]
struct Cli {
    /// Task to run
    #[arg(value_enum)]
    task: Task,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "trawl.toml")]
    config: PathBuf,

    /// Re-index pages that are already indexed
    #[arg(long)]
    reindex: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    /// Crawl from the seeds, or resume the previous crawl
    Crawler,

    /// Build the inverted index over crawled pages
    Indexer,

    /// Show statistics from the store and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.reindex {
        config.indexer.reindex = true;
    }

    match cli.task {
        Task::Crawler => handle_crawl(&config).await,
        Task::Indexer => handle_index(&config).await,
        Task::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl=info,warn"),
            1 => EnvFilter::new("trawl=debug,info"),
            2 => EnvFilter::new("trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Wires Ctrl+C to a fresh shutdown signal
fn interruptible() -> ShutdownSignal {
    let (trigger, signal) = shutdown::channel();
    shutdown::listen_for_ctrl_c(trigger);
    signal
}

/// Handles the crawler task
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, Blacklist: {}, Workers: {}",
        config.crawler.seeds.len(),
        config.crawler.blacklist.len(),
        config.crawler.max_workers
    );

    let summary = trawl::crawler::crawl(config, interruptible())
        .await
        .context("Crawl failed")?;
    println!("{}", summary);
    Ok(())
}

/// Handles the indexer task
async fn handle_index(config: &Config) -> anyhow::Result<()> {
    if config.indexer.reindex {
        tracing::info!("Reindexing pages that are already indexed");
    }

    let summary = trawl::indexer::index(config, interruptible())
        .await
        .context("Indexing failed")?;
    println!("{}", summary);
    Ok(())
}

/// Handles the stats task: shows statistics from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path.display());

    let storage = open_storage(&config.store.database_path)
        .context("Failed to open the store")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    storage.close()?;
    Ok(())
}
