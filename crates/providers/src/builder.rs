//! Transport and embedder construction from configuration.

use agentloom_config::AppConfig;
use agentloom_core::embedding::Embedder;
use agentloom_core::error::{DependencyError, TransportError};
use agentloom_core::transport::{ModelTransport, ProviderKind};
use std::sync::Arc;
use tracing::info;

use crate::embeddings::OpenAiEmbedder;
use crate::gemini::GeminiTransport;
use crate::openai_compat::{GROQ_BASE_URL, OPENAI_BASE_URL, OpenAiCompatTransport};
use crate::retry::RetryTransport;

/// Default API root for a provider kind. Azure has none; its endpoint is
/// per-resource.
pub fn default_base_url(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some(OPENAI_BASE_URL),
        ProviderKind::Groq => Some(GROQ_BASE_URL),
        ProviderKind::Gemini => Some(crate::gemini::GEMINI_BASE_URL),
        ProviderKind::Azure => None,
    }
}

/// Build the configured model transport, wrapped in [`RetryTransport`].
pub fn build_transport(config: &AppConfig) -> std::result::Result<Arc<dyn ModelTransport>, TransportError> {
    let provider = &config.provider;
    let kind = provider
        .kind()
        .map_err(|e| TransportError::NotConfigured(e.to_string()))?;
    let api_key = provider
        .api_key
        .clone()
        .ok_or_else(|| TransportError::NotConfigured(format!("no API key configured for provider '{kind}'")))?;
    let model = provider.model();

    let transport: Arc<dyn ModelTransport> = match kind {
        ProviderKind::OpenAi | ProviderKind::Groq => {
            let base_url = provider
                .base_url
                .clone()
                .or_else(|| default_base_url(kind).map(String::from))
                .unwrap_or_default();
            Arc::new(OpenAiCompatTransport::new(kind.as_str(), kind, base_url, api_key, model))
        }
        ProviderKind::Azure => {
            let endpoint = provider
                .azure_endpoint
                .as_deref()
                .ok_or_else(|| TransportError::NotConfigured("azure_endpoint is required".into()))?;
            let deployment = provider
                .azure_deployment
                .as_deref()
                .ok_or_else(|| TransportError::NotConfigured("azure_deployment is required".into()))?;
            Arc::new(OpenAiCompatTransport::azure(
                endpoint,
                deployment,
                &provider.azure_api_version,
                api_key,
                model,
            ))
        }
        ProviderKind::Gemini => match &provider.base_url {
            Some(base_url) => Arc::new(GeminiTransport::with_base_url(base_url, api_key, model)),
            None => Arc::new(GeminiTransport::new(api_key, model)),
        },
    };

    info!(provider = %kind, model = %transport.model(), "Model transport ready");

    if provider.retry_attempts > 1 {
        Ok(Arc::new(RetryTransport::new(transport, provider.retry_attempts)))
    } else {
        Ok(transport)
    }
}

/// Build the embedder used by the vector store. The embedding key falls back
/// to the provider key.
pub fn build_embedder(config: &AppConfig) -> std::result::Result<Arc<dyn Embedder>, DependencyError> {
    let embedding = &config.embedding;
    let api_key = embedding
        .api_key
        .clone()
        .or_else(|| config.provider.api_key.clone())
        .ok_or_else(|| DependencyError::Embedding("no API key configured for embeddings".into()))?;
    let base_url = embedding.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);

    Ok(Arc::new(OpenAiEmbedder::with_base_url(base_url, api_key, &embedding.model)))
}
