//! JSON batch artifacts.
//!
//! One file per source per run date, overwritten on re-run:
//! ```text
//! output_dir/
//! └── 2021-01-05/
//!     ├── sudan-tribune.json
//!     ├── afghanistan-times.json
//!     └── hiiraan.json
//! ```
//! Each file is an array of canonical [`ArticleRecord`]s in discovery order.

use crate::error::CrawlError;
use crate::models::ArticleRecord;
use crate::scrapers::SourceId;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Location of the artifact for `source` on `run_date`.
pub fn batch_path(output_dir: &Path, run_date: NaiveDate, source: SourceId) -> PathBuf {
    output_dir
        .join(run_date.format("%Y-%m-%d").to_string())
        .join(format!("{source}.json"))
}

/// Serialize `records` to the artifact path and return it.
///
/// An existing file for the same source and date is replaced.
///
/// # Arguments
///
/// * `records` - Assembled records in discovery order
/// * `output_dir` - Root of the dated batch directories
/// * `run_date` - Date that names the subdirectory
/// * `source` - Source that names the file
///
/// # Returns
///
/// The path written, as computed by [`batch_path`].
///
/// # Errors
///
/// [`CrawlError::Io`] when the directory or file cannot be written.
///
/// # Examples
///
/// ```ignore
/// let path = write_batch(&report.records, Path::new("out"), run_date, SourceId::Hiiraan).await?;
/// assert!(path.ends_with("hiiraan.json"));
/// ```
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %source, %run_date))]
pub async fn write_batch(
    records: &[ArticleRecord],
    output_dir: &Path,
    run_date: NaiveDate,
    source: SourceId,
) -> Result<PathBuf, CrawlError> {
    let json = serde_json::to_string_pretty(records)?;
    let path = batch_path(output_dir, run_date, source);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create batch directory");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), records = records.len(), "Wrote batch artifact");
    Ok(path)
}
