//! Command-line interface definitions.
//!
//! Flags left unset fall back to the YAML config file (`--config`), then to
//! built-in defaults.

use crate::pipeline::MAX_CONCURRENCY;
use crate::scrapers::SourceId;
use chrono::NaiveDate;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Crawl national news outlets into a deduplicated article corpus.
///
/// # Examples
///
/// ```sh
/// # Crawl every source into ./corpus.db and write artifacts to ./batches
/// newsdesk_crawler crawl -d ./corpus.db -o ./batches
///
/// # One source, dry run, give up after two minutes
/// newsdesk_crawler crawl -o ./batches --source hiiraan --dry-run --run-timeout-secs 120
///
/// # Load a legacy export
/// newsdesk_crawler import -d ./corpus.db ./old_sudan_tribune.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover, fetch and parse articles, then upsert them and write batch artifacts
    Crawl(CrawlArgs),
    /// Upsert a JSON array of articles in canonical or legacy shape
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// SQLite database holding the article corpus
    #[arg(short, long, env = "NEWSDESK_DATABASE", default_value = "newsdesk.db")]
    pub database: PathBuf,

    /// Directory for per-source JSON batch artifacts
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Date naming this run's artifacts (YYYY-MM-DD; default today, local time)
    #[arg(long)]
    pub run_date: Option<NaiveDate>,

    /// Source to crawl; repeat for several (default: all enabled)
    #[arg(short, long = "source", value_enum)]
    pub sources: Vec<SourceId>,

    /// Maximum in-flight article fetches per source (1 to 256)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_CONCURRENCY as u64))]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Abandon fetches still running this many seconds after start
    #[arg(long)]
    pub run_timeout_secs: Option<u64>,

    /// Retries for transient fetch failures
    #[arg(long, default_value_t = 0)]
    pub retries: usize,

    /// Base delay of the exponential retry backoff, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub retry_base_delay_ms: u64,

    /// Upper bound of the random jitter added to each retry delay, in milliseconds
    #[arg(long, default_value_t = 250)]
    pub retry_max_jitter_ms: u64,

    /// Keep records in memory instead of writing the database
    #[arg(long)]
    pub dry_run: bool,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// SQLite database holding the article corpus
    #[arg(short, long, env = "NEWSDESK_DATABASE", default_value = "newsdesk.db")]
    pub database: PathBuf,

    /// JSON file containing an array of articles
    pub file: PathBuf,
}
