use super::{ArticleStore, UpsertResult, check_constraints};
use crate::error::UpsertError;
use crate::models::ArticleRecord;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store keyed by title.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<BTreeMap<String, ArticleRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row, ordered by title.
    #[cfg(test)]
    pub async fn records(&self) -> Vec<ArticleRecord> {
        self.rows.read().await.values().cloned().collect()
    }
}

impl ArticleStore for MemoryStore {
    async fn upsert(&self, batch: &[ArticleRecord]) -> UpsertResult {
        let mut result = UpsertResult::default();
        let mut rows = self.rows.write().await;
        for record in batch {
            let outcome = check_constraints(record).map(|()| {
                rows.insert(record.title.clone(), record.clone());
            });
            result.record(record, outcome);
        }
        result
    }

    async fn get(&self, title: &str) -> Result<Option<ArticleRecord>, UpsertError> {
        Ok(self.rows.read().await.get(title).cloned())
    }

    async fn count(&self) -> Result<usize, UpsertError> {
        Ok(self.rows.read().await.len())
    }
}
