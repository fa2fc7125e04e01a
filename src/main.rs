//! # Newsdesk Crawler
//!
//! Crawls national news outlets, extracts article records with their
//! datelines, and upserts them into a corpus deduplicated by title.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk_crawler crawl -d ./corpus.db -o ./batches
//! newsdesk_crawler import -d ./corpus.db ./legacy.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: walk each source's selector chain from its landing pages
//! 2. **Fetching**: download candidate pages, bounded per source
//! 3. **Parsing**: title and body paragraphs, then the leading dateline
//! 4. **Assembly**: canonical records stamped with source defaults
//! 5. **Output**: upsert into the store and write one JSON batch per source

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assemble;
mod cli;
mod config;
mod dateline;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Command, CrawlArgs, DEFAULT_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS, ImportArgs};
use config::{CrawlConfig, DEFAULT_USER_AGENT};
use error::CrawlError;
use fetch::{HttpFetcher, RetryFetch};
use outputs::json;
use pipeline::{RunOptions, import_batch, run_all};
use store::{ArticleStore, MemoryStore, SqliteStore, Store};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsdesk_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let outcome = match args.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Import(args) => import(args).await,
    };
    if let Err(e) = &outcome {
        error!(error = %e, "Run failed");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    outcome?;
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn crawl(args: CrawlArgs) -> Result<(), CrawlError> {
    let config = match &args.config {
        Some(path) => CrawlConfig::load(path).await?,
        None => CrawlConfig::default(),
    };
    let profiles = config.profiles(&args.sources)?;
    let run_date = args.run_date.unwrap_or_else(|| Local::now().date_naive());

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let concurrency = args
        .concurrency
        .or(config.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    let request_timeout = args
        .request_timeout_secs
        .or(config.request_timeout_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    let fetcher = RetryFetch::new(
        HttpFetcher::new(user_agent, Duration::from_secs(request_timeout))?,
        args.retries,
        Duration::from_millis(args.retry_base_delay_ms),
    )
    .with_max_jitter(Duration::from_millis(args.retry_max_jitter_ms));
    let store = if args.dry_run {
        info!("Dry run; records stay in memory");
        Store::Memory(MemoryStore::new())
    } else {
        Store::Sqlite(SqliteStore::open(&args.database).await?)
    };
    let options = RunOptions {
        concurrency,
        deadline: args
            .run_timeout_secs
            .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs)),
        ..RunOptions::default()
    };

    info!(
        sources = ?profiles.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        %run_date,
        concurrency,
        request_timeout,
        retries = args.retries,
        "Starting crawl"
    );
    let reports = run_all(&fetcher, &store, &profiles, options).await;

    for report in &reports {
        // Keep an earlier artifact of the day rather than replace it with nothing.
        if report.discovery_error.is_some() {
            warn!(source = %report.source, "No batch artifact written; discovery failed");
            continue;
        }
        if let Err(e) = json::write_batch(&report.records, &args.output_dir, run_date, report.source).await {
            error!(source = %report.source, error = %e, "Failed to write batch artifact");
        }
    }

    info!(
        sources = reports.len(),
        failed_sources = reports.iter().filter(|r| r.discovery_error.is_some()).count(),
        discovered = reports.iter().map(|r| r.discovered).sum::<usize>(),
        assembled = reports.iter().map(|r| r.records.len()).sum::<usize>(),
        dropped = reports.iter().map(|r| r.failures.len()).sum::<usize>(),
        upserted = reports.iter().map(|r| r.upsert.succeeded.len()).sum::<usize>(),
        constraint_failures = reports.iter().map(|r| r.upsert.constraint_failures()).sum::<usize>(),
        connectivity_failures = reports.iter().map(|r| r.upsert.connectivity_failures()).sum::<usize>(),
        "Crawl complete"
    );
    match store.count().await {
        Ok(rows) => info!(rows, "Corpus size"),
        Err(e) => warn!(error = %e, "Could not count corpus rows"),
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(file = %args.file.display()))]
async fn import(args: ImportArgs) -> Result<(), CrawlError> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let store = SqliteStore::open(&args.database).await?;
    let report = import_batch(&store, &text).await?;
    for failure in &report.upsert.failed {
        warn!(url = %failure.url, error = %failure.error, "Upsert failed");
    }
    match store.count().await {
        Ok(rows) => info!(database = %store.db_path().display(), rows, "Corpus size"),
        Err(e) => warn!(error = %e, "Could not count corpus rows"),
    }
    Ok(())
}
