//! In-memory record storage — useful for testing and ephemeral sessions.

use agentloom_core::embedding::{EmbeddingRecord, RecordFilter, RecordStorage};
use agentloom_core::error::DependencyError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Records {
    /// Insertion order
    ordered: Vec<EmbeddingRecord>,
    /// content → position in `ordered`
    index: HashMap<String, usize>,
}

/// Stores embedding records in a Vec with a content index.
#[derive(Default)]
pub struct InMemoryStorage {
    records: RwLock<Records>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStorage for InMemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, contents: &[String]) -> Result<Vec<Option<Vec<f32>>>, DependencyError> {
        let records = self.records.read().await;
        Ok(contents
            .iter()
            .map(|c| records.index.get(c).map(|&i| records.ordered[i].vector.clone()))
            .collect())
    }

    async fn insert(&self, new_records: Vec<EmbeddingRecord>) -> Result<usize, DependencyError> {
        let mut records = self.records.write().await;
        let mut inserted = 0;
        for record in new_records {
            if records.index.contains_key(&record.content) {
                continue;
            }
            let position = records.ordered.len();
            records.index.insert(record.content.clone(), position);
            records.ordered.push(record);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn scan(&self, filter: Option<&RecordFilter>) -> Result<Vec<EmbeddingRecord>, DependencyError> {
        let records = self.records.read().await;
        Ok(records
            .ordered
            .iter()
            .filter(|r| filter.is_none_or(|f| f(*r)))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, DependencyError> {
        Ok(self.records.read().await.ordered.len())
    }

    async fn clear(&self) -> Result<(), DependencyError> {
        let mut records = self.records.write().await;
        records.ordered.clear();
        records.index.clear();
        Ok(())
    }
}
