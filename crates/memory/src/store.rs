//! The vector store: an embedder plus a record storage backend.
//!
//! Contents are unique keys. Adding a document whose content is already
//! stored costs nothing — the embedder only ever sees texts that are new.

use agentloom_core::embedding::{
    Document, Embedder, EmbeddingRecord, RecordFilter, RecordStorage, ScoredRecord, SimilaritySearch,
};
use agentloom_core::error::DependencyError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::vector::rank_by_similarity;

/// Metadata to attach when adding raw texts.
#[derive(Debug, Clone, Default)]
pub enum TextMetadata {
    #[default]
    None,
    /// The same metadata for every text
    Shared(serde_json::Value),
    /// One entry per text; missing entries become `null`
    PerText(Vec<serde_json::Value>),
}

/// Deduplicating embedding store with exhaustive similarity search.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    storage: Arc<dyn RecordStorage>,
    write_lock: Mutex<()>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn Embedder>, storage: Arc<dyn RecordStorage>) -> Self {
        Self {
            embedder,
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage_name(&self) -> &str {
        self.storage.name()
    }

    /// Embed and store documents whose content is not stored yet.
    ///
    /// Within one batch the first occurrence of a content wins. Returns the
    /// number of records actually added.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, DependencyError> {
        let mut seen = HashSet::new();
        let unique: Vec<Document> = documents
            .into_iter()
            .filter(|doc| seen.insert(doc.content.clone()))
            .collect();
        if unique.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;

        let contents: Vec<String> = unique.iter().map(|d| d.content.clone()).collect();
        let existing = self.storage.lookup(&contents).await?;

        let missing: Vec<Document> = unique
            .into_iter()
            .zip(existing)
            .filter_map(|(doc, stored)| stored.is_none().then_some(doc))
            .collect();
        if missing.is_empty() {
            debug!(storage = self.storage.name(), "All documents already stored");
            return Ok(0);
        }

        let texts: Vec<String> = missing.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(DependencyError::Embedding(format!(
                "{} returned {} vectors for {} texts",
                self.embedder.name(),
                vectors.len(),
                texts.len()
            )));
        }

        let records = missing
            .into_iter()
            .zip(vectors)
            .map(|(doc, vector)| EmbeddingRecord {
                content: doc.content,
                vector,
                metadata: doc.metadata,
            })
            .collect();

        let inserted = self.storage.insert(records).await?;
        debug!(storage = self.storage.name(), inserted, "Added documents to vector store");
        Ok(inserted)
    }

    /// Add raw texts with optional metadata.
    pub async fn add_texts(&self, texts: Vec<String>, metadata: TextMetadata) -> Result<usize, DependencyError> {
        let documents = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let meta = match &metadata {
                    TextMetadata::None => serde_json::Value::Null,
                    TextMetadata::Shared(value) => value.clone(),
                    TextMetadata::PerText(values) => values.get(i).cloned().unwrap_or(serde_json::Value::Null),
                };
                Document::new(text).with_metadata(meta)
            })
            .collect();
        self.add_documents(documents).await
    }

    /// The stored vector for `text` when it is already a record, else a
    /// fresh embedding.
    pub async fn get_query_vector(&self, text: &str) -> Result<Vec<f32>, DependencyError> {
        let stored = self.storage.lookup(&[text.to_string()]).await?;
        if let Some(Some(vector)) = stored.into_iter().next() {
            return Ok(vector);
        }
        self.embedder.embed(text).await
    }

    /// Search by text.
    pub async fn similarity_search(
        &self,
        text: &str,
        k: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, DependencyError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = self.get_query_vector(text).await?;
        self.similarity_search_vector_with_score(&query, k, filter).await
    }

    pub async fn len(&self) -> Result<usize, DependencyError> {
        self.storage.count().await
    }

    pub async fn is_empty(&self) -> Result<bool, DependencyError> {
        Ok(self.len().await? == 0)
    }

    pub async fn clear(&self) -> Result<(), DependencyError> {
        let _guard = self.write_lock.lock().await;
        self.storage.clear().await
    }
}

#[async_trait]
impl SimilaritySearch for VectorStore {
    async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, DependencyError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let records = self.storage.scan(filter).await?;
        Ok(rank_by_similarity(records, query, k))
    }
}
