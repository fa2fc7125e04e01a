//! Persistence port for article records.
//!
//! [`ArticleStore::upsert`] is insert-or-update keyed on `title`: an existing
//! row has every other column overwritten, a new title inserts a row. Each
//! record is applied on its own, so a batch may partially succeed; the
//! [`UpsertResult`] says which titles made it and why the others did not.
//!
//! Backends:
//! - [`SqliteStore`]: on-disk corpus (table `collection`)
//! - [`MemoryStore`]: process-local map for dry runs and tests
//!
//! [`Store`] picks one at runtime.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::UpsertError;
use crate::models::ArticleRecord;
use serde::Serialize;

/// Narrow write port of the corpus, plus the reads needed to verify it.
pub trait ArticleStore {
    /// Insert or update every record of `batch`, one at a time.
    async fn upsert(&self, batch: &[ArticleRecord]) -> UpsertResult;

    /// Stored row for `title`, if any.
    async fn get(&self, title: &str) -> Result<Option<ArticleRecord>, UpsertError>;

    /// Number of stored rows.
    async fn count(&self) -> Result<usize, UpsertError>;
}

/// Per-record outcome of an upsert batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertResult {
    /// Titles written, in batch order.
    pub succeeded: Vec<String>,
    /// Records rejected, in batch order.
    pub failed: Vec<UpsertFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertFailure {
    pub title: String,
    pub url: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: UpsertError,
}

fn serialize_display<S: serde::Serializer>(e: &UpsertError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

impl UpsertResult {
    pub(crate) fn record(&mut self, record: &ArticleRecord, outcome: Result<(), UpsertError>) {
        match outcome {
            Ok(()) => self.succeeded.push(record.title.clone()),
            Err(error) => self.failed.push(UpsertFailure {
                title: record.title.clone(),
                url: record.url.clone(),
                error,
            }),
        }
    }

    pub fn constraint_failures(&self) -> usize {
        self.failed
            .iter()
            .filter(|f| matches!(f.error, UpsertError::Constraint(_)))
            .count()
    }

    pub fn connectivity_failures(&self) -> usize {
        self.failed
            .iter()
            .filter(|f| matches!(f.error, UpsertError::Connectivity(_)))
            .count()
    }
}

/// Runtime choice of backend.
pub enum Store {
    Sqlite(SqliteStore),
    Memory(MemoryStore),
}

impl ArticleStore for Store {
    async fn upsert(&self, batch: &[ArticleRecord]) -> UpsertResult {
        match self {
            Store::Sqlite(s) => s.upsert(batch).await,
            Store::Memory(s) => s.upsert(batch).await,
        }
    }

    async fn get(&self, title: &str) -> Result<Option<ArticleRecord>, UpsertError> {
        match self {
            Store::Sqlite(s) => s.get(title).await,
            Store::Memory(s) => s.get(title).await,
        }
    }

    async fn count(&self) -> Result<usize, UpsertError> {
        match self {
            Store::Sqlite(s) => s.count().await,
            Store::Memory(s) => s.count().await,
        }
    }
}

/// Rules both backends enforce; SQLite mirrors them as `CHECK` constraints.
pub(crate) fn check_constraints(record: &ArticleRecord) -> Result<(), UpsertError> {
    if record.title.trim().is_empty() {
        return Err(UpsertError::Constraint("title must not be empty".to_string()));
    }
    if record.body.is_empty() {
        return Err(UpsertError::Constraint("body must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::ArticleRecord;
    use chrono::NaiveDate;

    pub fn record(title: &str, body: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            body: body.to_string(),
            url: format!("https://www.sudantribune.com/{}", title.len()),
            country: "SD".to_string(),
            source_name: "Sudan Tribune".to_string(),
            city: Some("KHARTOUM".to_string()),
            published_on: NaiveDate::from_ymd_opt(2021, 1, 5),
        }
    }
}
