//! Fetchrank main entry point
//!
//! This is the command-line interface that wires the store, the ingestion
//! pool, the rescan scheduler and the HTTP API together.

use anyhow::Context;
use clap::Parser;
use fetchrank::api::{self, AppState};
use fetchrank::config::{load_config_with_hash, Config};
use fetchrank::fetch::HttpDownloader;
use fetchrank::record::decode_all;
use fetchrank::rescan::rank_candidates;
use fetchrank::store::{open_store, RecordStore};
use fetchrank::{IngestionPool, RescanScheduler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Fetchrank: URL ingestion with periodic popularity rescans
///
/// Accepts URLs over HTTP, downloads each distinct URL once, counts how
/// often every URL was submitted, and periodically re-downloads the most
/// submitted ones.
#[derive(Parser, Debug)]
#[command(name = "fetchrank")]
#[command(version)]
#[command(about = "URL ingestion with periodic popularity rescans", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print it without starting the service
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// Print stored URLs ranked by submission count and exit
    #[arg(long, conflicts_with = "dry_run")]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.list {
        handle_list(&config)
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fetchrank=info,warn"),
            1 => EnvFilter::new("fetchrank=debug,tower_http=debug,info"),
            2 => EnvFilter::new("fetchrank=trace,debug"),
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

/// Handles the --dry-run mode: prints the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Fetchrank Dry Run ===\n");

    println!("Server:");
    println!("  Listen: {}", config.server.bind_address());

    println!("\nIngestion pool:");
    println!("  Workers: {}", config.pool.workers);
    println!("  Queue capacity: {}", config.pool.queue_capacity);

    println!("\nRescan:");
    println!("  Interval: {}s", config.rescan.interval_secs);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);
    println!("  Table: {}", config.store.table_name);

    println!("\nHTTP client:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);

    println!("\n✓ Configuration is valid");
}

/// Handles the --list mode: prints stored records, most submitted first
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(
        Path::new(&config.store.database_path),
        &config.store.table_name,
    )?;

    let (mut records, skipped) = decode_all(&store.get_all()?);
    records.sort_by(|a, b| b.submission_count.cmp(&a.submission_count));

    println!("Database: {}\n", config.store.database_path);
    for record in &records {
        println!(
            "{:>6}  {}  (first seen {}, last seen {})",
            record.submission_count,
            record.address,
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339()
        );
    }
    println!("\n{} records ({} undecodable)", records.len(), skipped);

    let top = rank_candidates(records);
    println!("Next rescan would download {} URLs", top.len());

    store.disconnect()?;
    Ok(())
}

/// Runs the service until Ctrl-C
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn RecordStore> = Arc::new(open_store(
        Path::new(&config.store.database_path),
        &config.store.table_name,
    )?);
    let downloader = Arc::new(HttpDownloader::from_config(&config.http)?);

    let (pool, submitter) = IngestionPool::new(
        config.pool.workers,
        config.pool.queue_capacity,
        Arc::clone(&store),
        downloader.clone(),
    );
    let pool_handle = tokio::spawn(pool.run());

    let scheduler = Arc::new(RescanScheduler::new(
        config.rescan.interval(),
        Arc::clone(&store),
        downloader,
    ));
    let rescan_handle = scheduler.start()?;

    let listener = tokio::net::TcpListener::bind(config.server.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address()))?;

    let state = AppState {
        store: Arc::clone(&store),
        submitter,
    };
    api::serve(listener, state, shutdown_signal()).await?;

    // The router, and with it the last Submitter, is gone: the pool drains and returns
    tracing::info!("Shutting down");
    scheduler.stop();
    if let Err(e) = rescan_handle.await {
        tracing::error!("Rescan loop terminated abnormally: {}", e);
    }
    if let Err(e) = pool_handle.await {
        tracing::error!("Ingestion pool terminated abnormally: {}", e);
    }

    store.disconnect()?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
