//! Embedding records and the traits behind the vector store.
//!
//! The store itself lives in `agentloom-memory`; this module defines what it
//! composes: an [`Embedder`] that turns text into vectors and a
//! [`RecordStorage`] backend that keeps records keyed by their content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DependencyError;

/// A text to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,

    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A stored text with its embedding. `content` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub content: String,
    pub vector: Vec<f32>,

    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: EmbeddingRecord,
    /// Cosine similarity with the query, in [-1, 1]
    pub score: f32,
}

/// Predicate applied to records before scoring.
pub type RecordFilter = dyn Fn(&EmbeddingRecord) -> bool + Send + Sync;

/// Filter matching records whose metadata has `key` equal to `value`.
pub fn metadata_equals(key: impl Into<String>, value: serde_json::Value) -> Box<RecordFilter> {
    let key = key.into();
    Box::new(move |record: &EmbeddingRecord| record.metadata.get(&key) == Some(&value))
}

/// Turns texts into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed every text; the result has one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, DependencyError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, DependencyError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DependencyError::Embedding("embedder returned no vector".into()))
    }
}

/// Persistence backend for embedding records.
///
/// Records are kept in insertion order and are unique by content; inserting
/// a record whose content already exists leaves the stored one untouched.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Backend name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Stored vectors for the given contents, `None` where absent.
    async fn lookup(&self, contents: &[String]) -> std::result::Result<Vec<Option<Vec<f32>>>, DependencyError>;

    /// Insert records, skipping existing contents. Returns how many were new.
    async fn insert(&self, records: Vec<EmbeddingRecord>) -> std::result::Result<usize, DependencyError>;

    /// All records (optionally filtered), in insertion order.
    async fn scan(&self, filter: Option<&RecordFilter>) -> std::result::Result<Vec<EmbeddingRecord>, DependencyError>;

    async fn count(&self) -> std::result::Result<usize, DependencyError>;

    async fn clear(&self) -> std::result::Result<(), DependencyError>;
}

/// Nearest-neighbour search over stored records.
///
/// The vector store implements this with an exhaustive scan; an indexed
/// backend can replace it behind the same signature.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// The `k` records most similar to `query`, best first.
    async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&RecordFilter>,
    ) -> std::result::Result<Vec<ScoredRecord>, DependencyError>;
}
