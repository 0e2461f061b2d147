//! Knowledge search tool — semantic lookup over the vector store.
//!
//! This tool bridges the tools system with the vector store, giving the
//! agent the ability to pull ingested passages relevant to a question on
//! demand. Results come back as a JSON array of `{content, metadata, score}`,
//! best match first.

use agentloom_core::error::ToolError;
use agentloom_core::tool::{Tool, ToolOutput};
use agentloom_memory::VectorStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SEARCH_K: usize = 4;
const MAX_SEARCH_K: u64 = 50;

/// Searches the vector store for passages similar to a query.
pub struct KnowledgeSearchTool {
    store: Arc<VectorStore>,
    default_k: usize,
}

impl KnowledgeSearchTool {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self {
            store,
            default_k: DEFAULT_SEARCH_K,
        }
    }

    /// Number of results when the model does not pass `k`.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }
}

#[derive(serde::Serialize)]
struct SearchHit<'a> {
    content: &'a str,
    metadata: &'a serde_json::Value,
    score: f32,
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "knowledge_search"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for passages relevant to a question. \
         Use this when the answer may be in previously ingested documents."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                },
                "k": {
                    "type": "integer",
                    "description": "Maximum number of passages to return (default 4)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let k = arguments["k"]
            .as_u64()
            .map(|k| k.min(MAX_SEARCH_K) as usize)
            .unwrap_or(self.default_k);

        let results = self
            .store
            .similarity_search(query, k, None)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        debug!(query, k, hits = results.len(), "Knowledge search complete");

        let hits: Vec<SearchHit<'_>> = results
            .iter()
            .map(|r| SearchHit {
                content: &r.record.content,
                metadata: &r.record.metadata,
                score: r.score,
            })
            .collect();

        let value = serde_json::to_value(&hits).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolOutput::json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_core::embedding::Embedder;
    use agentloom_core::error::DependencyError;
    use agentloom_memory::{InMemoryStorage, TextMetadata};
    use serde_json::json;

    /// Two-dimensional embedding: animals point one way, vehicles the other.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn name(&self) -> &str {
            "axis"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DependencyError> {
            Ok(texts
                .iter()
                .map(|t| match t.as_str() {
                    "cat" => vec![1.0, 0.0],
                    "dog" => vec![0.9, 0.1],
                    "car" => vec![0.0, 1.0],
                    _ => vec![0.7, 0.7],
                })
                .collect())
        }
    }

    async fn populated_store() -> Arc<VectorStore> {
        let store = Arc::new(VectorStore::new(Arc::new(AxisEmbedder), Arc::new(InMemoryStorage::new())));
        store
            .add_texts(
                vec!["cat".into(), "dog".into(), "car".into()],
                TextMetadata::Shared(json!({"source": "test"})),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn returns_ranked_json_array() {
        let tool = KnowledgeSearchTool::new(populated_store().await);
        let output = tool.execute(json!({"query": "cat", "k": 2})).await.unwrap();

        let hits: Vec<serde_json::Value> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["content"], "cat");
        assert_eq!(hits[1]["content"], "dog");
        assert_eq!(hits[0]["metadata"]["source"], "test");
        assert!((hits[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
        assert!(output.data.is_some());
    }

    #[tokio::test]
    async fn uses_default_k() {
        let tool = KnowledgeSearchTool::new(populated_store().await).with_default_k(1);
        let output = tool.execute(json!({"query": "car"})).await.unwrap();
        let hits: Vec<serde_json::Value> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["content"], "car");
    }

    #[tokio::test]
    async fn empty_store_returns_empty_array() {
        let store = Arc::new(VectorStore::new(Arc::new(AxisEmbedder), Arc::new(InMemoryStorage::new())));
        let output = KnowledgeSearchTool::new(store).execute(json!({"query": "cat"})).await.unwrap();
        assert_eq!(output.content, "[]");
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = KnowledgeSearchTool::new(populated_store().await);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
