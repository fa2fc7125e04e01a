//! The crawl pipeline: discover → fetch → parse → dateline → assemble → upsert.
//!
//! Each candidate URL is an independent unit of work. Up to
//! `RunOptions::concurrency` units run at once per source; each one sends its
//! outcome, tagged with the candidate's discovery index, into a channel with
//! a single consumer. The consumer restores discovery order before anything
//! is logged, reported or persisted.
//!
//! A per-item failure (fetch, parse) drops that candidate and is recorded in
//! the [`SourceReport`]. A discovery failure ends the source's run with an
//! empty batch. A crawl run never returns an error to the caller.

use crate::assemble::{CleanFn, assemble, normalize_whitespace};
use crate::error::{CrawlError, FetchError, FetchErrorKind, ItemError};
use crate::fetch::Fetch;
use crate::models::{ArticleRecord, CandidateUrl, Dateline, RawFields, StoredArticle};
use crate::scrapers::discovery::discover;
use crate::scrapers::parser::parse;
use crate::scrapers::{SourceId, SourceProfile};
use crate::store::{ArticleStore, UpsertResult};
use crate::utils::truncate_for_log;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::Instant as StdInstant;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on in-flight fetches per source; larger requests are clamped.
pub const MAX_CONCURRENCY: usize = 256;

/// Knobs of a crawl run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Maximum in-flight fetches per source.
    pub concurrency: usize,
    /// Run-level deadline; fetches still in flight at this instant are abandoned.
    pub deadline: Option<Instant>,
    /// Text cleaning applied to every body paragraph after dateline extraction.
    pub clean: CleanFn,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            deadline: None,
            clean: normalize_whitespace,
        }
    }
}

/// A candidate that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Discovery index of the candidate.
    pub index: usize,
    pub url: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ItemError,
}

fn serialize_display<S: serde::Serializer>(e: &ItemError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

/// Outcome of one source's run, in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: SourceId,
    /// Number of candidate URLs discovered.
    pub discovered: usize,
    /// Assembled records, in discovery order.
    pub records: Vec<ArticleRecord>,
    /// Dropped candidates, in discovery order.
    pub failures: Vec<ItemFailure>,
    /// Records kept without date and city because their dateline was unusable.
    pub dateline_errors: usize,
    /// Set when discovery itself failed and the run ended early.
    pub discovery_error: Option<String>,
    pub upsert: UpsertResult,
}

impl SourceReport {
    fn new(source: SourceId) -> Self {
        Self {
            source,
            discovered: 0,
            records: Vec::new(),
            failures: Vec::new(),
            dateline_errors: 0,
            discovery_error: None,
            upsert: UpsertResult::default(),
        }
    }
}

/// An assembled record, flagged when its dateline had to be discarded.
#[derive(Debug)]
struct Processed {
    record: ArticleRecord,
    dateline_discarded: bool,
}

/// Crawl every profile concurrently, each against the same store.
pub async fn run_all<F, S>(
    fetcher: &F,
    store: &S,
    profiles: &[SourceProfile],
    options: RunOptions,
) -> Vec<SourceReport>
where
    F: Fetch,
    S: ArticleStore,
{
    join_all(
        profiles
            .iter()
            .map(|profile| run_source(fetcher, store, profile, options)),
    )
    .await
}

/// Crawl one source end to end and persist its batch.
///
/// # Arguments
///
/// * `fetcher` - Transport for landing and article pages.
/// * `store` - Destination of the assembled records.
/// * `profile` - Where to find links and fields for this source.
/// * `options` - Concurrency, deadline and cleaning function.
///
/// # Returns
///
/// A [`SourceReport`] whose records and failures are in discovery order.
/// Nothing is upserted when discovery fails; `discovery_error` says why.
///
/// # Examples
///
/// ```ignore
/// let store = MemoryStore::new();
/// let report = run_source(&fetcher, &store, &SourceId::Hiiraan.profile(), RunOptions::default()).await;
/// println!("{} of {} assembled", report.records.len(), report.discovered);
/// ```
#[instrument(level = "info", skip_all, fields(source = %profile.id))]
pub async fn run_source<F, S>(
    fetcher: &F,
    store: &S,
    profile: &SourceProfile,
    options: RunOptions,
) -> SourceReport
where
    F: Fetch,
    S: ArticleStore,
{
    let t0 = StdInstant::now();
    let mut report = SourceReport::new(profile.id);

    let discovered = match options.deadline {
        Some(deadline) => timeout_at(deadline, discover(fetcher, profile))
            .await
            .unwrap_or_else(|_| {
                let url = profile.landing_pages.first().cloned().unwrap_or_default();
                Err(CrawlError::Discovery(FetchError::new(
                    url,
                    FetchErrorKind::Cancelled,
                )))
            }),
        None => discover(fetcher, profile).await,
    };
    let candidates = match discovered {
        Ok(candidates) => candidates,
        Err(e) => {
            error!(error = %e, "Discovery failed; skipping source");
            report.discovery_error = Some(e.to_string());
            return report;
        }
    };
    report.discovered = candidates.len();

    for (index, outcome) in process_all(fetcher, profile, &candidates, options).await {
        let url = candidates[index].url.as_str();
        match outcome {
            Ok(processed) => {
                debug!(index, %url, title = %truncate_for_log(&processed.record.title, 80), "Assembled record");
                report.dateline_errors += usize::from(processed.dateline_discarded);
                report.records.push(processed.record);
            }
            Err(e) => {
                warn!(index, %url, source = %profile.id, error = %e, "Dropping candidate");
                report.failures.push(ItemFailure {
                    index,
                    url: url.to_string(),
                    error: e,
                });
            }
        }
    }

    report.upsert = store.upsert(&report.records).await;
    for failure in &report.upsert.failed {
        warn!(url = %failure.url, title = %truncate_for_log(&failure.title, 80), error = %failure.error, "Upsert failed");
    }

    info!(
        discovered = report.discovered,
        assembled = report.records.len(),
        dropped = report.failures.len(),
        dateline_errors = report.dateline_errors,
        upserted = report.upsert.succeeded.len(),
        upsert_failed = report.upsert.failed.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Source run complete"
    );
    report
}

/// Run every candidate through fetch/parse/assemble with bounded concurrency.
///
/// Returns `(discovery index, outcome)` pairs sorted by index.
async fn process_all<F: Fetch>(
    fetcher: &F,
    profile: &SourceProfile,
    candidates: &[CandidateUrl],
    options: RunOptions,
) -> Vec<(usize, Result<Processed, ItemError>)> {
    let limit = options.concurrency.clamp(1, MAX_CONCURRENCY);
    let (tx, mut rx) = mpsc::channel(limit);

    let producer = async move {
        stream::iter(candidates)
            .for_each_concurrent(limit, |candidate| {
                let tx = tx.clone();
                async move {
                    let outcome = process_candidate(fetcher, profile, candidate, options).await;
                    // The consumer outlives every producer.
                    let _ = tx.send((candidate.index, outcome)).await;
                }
            })
            .await;
    };
    let consumer = async {
        let mut outcomes = Vec::with_capacity(candidates.len());
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    };

    let ((), mut outcomes) = tokio::join!(producer, consumer);
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes
}

/// One unit of work: everything that turns a candidate URL into a record.
async fn process_candidate<F: Fetch>(
    fetcher: &F,
    profile: &SourceProfile,
    candidate: &CandidateUrl,
    options: RunOptions,
) -> Result<Processed, ItemError> {
    debug!(%candidate, source = %profile.id, "Processing candidate");
    let fetched = match options.deadline {
        Some(deadline) => timeout_at(deadline, fetcher.fetch(&candidate.url))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::new(
                    candidate.url.as_str(),
                    FetchErrorKind::Cancelled,
                ))
            }),
        None => fetcher.fetch(&candidate.url).await,
    };
    let doc = fetched?;

    let parsed = parse(profile, &doc)?;
    let mut raw = parsed.clone();
    let dateline = profile.dateline_policy.apply(&mut raw);
    clean_paragraphs(&mut raw, options.clean);

    let url = candidate.url.as_str();
    match assemble(&raw, &dateline, &profile.defaults, url) {
        Ok(record) => Ok(Processed {
            record,
            dateline_discarded: false,
        }),
        Err(e) if e.is_dateline_error() => {
            warn!(%url, source = %profile.id, error = %e, "Unusable dateline; keeping article without date and city");
            // The prefix stays in the body when it is not a usable dateline.
            let mut raw = parsed;
            clean_paragraphs(&mut raw, options.clean);
            Ok(Processed {
                record: assemble(&raw, &Dateline::default(), &profile.defaults, url)?,
                dateline_discarded: true,
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn clean_paragraphs(raw: &mut RawFields, clean: CleanFn) {
    raw.body_paragraphs = raw
        .body_paragraphs
        .iter()
        .map(|p| clean(p))
        .filter(|p| !p.is_empty())
        .collect();
}

/// Outcome of loading a JSON export into the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Entries in the input array.
    pub read: usize,
    /// Entries that could not be mapped to the canonical shape.
    pub skipped: usize,
    pub upsert: UpsertResult,
}

/// Upsert a JSON array of articles in canonical or legacy shape.
///
/// Entries that match no known shape, or whose date cannot be mapped, are
/// skipped with a warning; a document that is not a JSON array is an error.
#[instrument(level = "info", skip_all)]
pub async fn import_batch<S: ArticleStore>(store: &S, json: &str) -> Result<ImportReport, CrawlError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut report = ImportReport {
        read: entries.len(),
        ..ImportReport::default()
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let mapped = serde_json::from_value::<StoredArticle>(entry)
            .map_err(|e| e.to_string())
            .and_then(|article| ArticleRecord::try_from(article).map_err(|e| e.to_string()));
        match mapped {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping article that cannot be mapped");
                report.skipped += 1;
            }
        }
    }

    report.upsert = store.upsert(&records).await;
    info!(
        read = report.read,
        skipped = report.skipped,
        upserted = report.upsert.succeeded.len(),
        upsert_failed = report.upsert.failed.len(),
        "Import complete"
    );
    Ok(report)
}
