//! OpenAI-compatible embeddings endpoint.

use agentloom_core::embedding::Embedder;
use agentloom_core::error::DependencyError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::http;
use crate::openai_compat::OPENAI_BASE_URL;

/// Embeds texts through `POST {base_url}/embeddings`.
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(OPENAI_BASE_URL, api_key, model)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http::client(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Order vectors by the response's `index` field.
    fn into_vectors(resp: EmbeddingApiResponse, expected: usize) -> std::result::Result<Vec<Vec<f32>>, DependencyError> {
        let mut data = resp.data;
        data.sort_by_key(|d| d.index);
        if data.len() != expected {
            return Err(DependencyError::Embedding(format!(
                "expected {expected} embeddings, got {}",
                data.len()
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, DependencyError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "encoding_format": "float",
        });

        debug!(model = %self.model, count = texts.len(), "Sending embedding request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DependencyError::Embedding(http::network_error(e).to_string()))?;

        let json = http::read_json("openai-embeddings", response)
            .await
            .map_err(|e| DependencyError::Embedding(e.to_string()))?;

        let parsed: EmbeddingApiResponse = serde_json::from_value(json)
            .map_err(|e| DependencyError::Embedding(format!("Failed to parse embedding response: {e}")))?;

        Self::into_vectors(parsed, texts.len())
    }
}

// --- Embedding API types ---

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
