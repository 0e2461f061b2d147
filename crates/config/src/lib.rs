//! Configuration loading, validation, and management for AgentLoom.
//!
//! Loads configuration from `~/.agentloom/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use agentloom_core::{GenerationConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentloom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sampling parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Conversation loop behavior
    #[serde(default)]
    pub agent: AgentConfig,

    /// Embedding provider for the vector store
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store backend and ingestion settings
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Conversation memory journal
    #[serde(default)]
    pub journal: JournalConfig,

    /// Key/value knowledge store behind the knowledge tools
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "openai", "azure", "groq" or "gemini"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Model name; each kind has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's API root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_deployment: Option<String>,

    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,

    /// Attempts per model call when the failure is a rate limit or network error
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_provider_kind() -> String {
    "openai".into()
}
fn default_azure_api_version() -> String {
    "2024-06-01".into()
}
fn default_retry_attempts() -> u32 {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            model: None,
            api_key: None,
            base_url: None,
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_version: default_azure_api_version(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_deployment", &self.azure_deployment)
            .field("azure_api_version", &self.azure_api_version)
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

impl ProviderConfig {
    /// The parsed provider kind.
    pub fn kind(&self) -> Result<ProviderKind, ConfigError> {
        self.kind.parse().map_err(ConfigError::ValidationError)
    }

    /// The configured model, or the default for the provider kind.
    pub fn model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.kind() {
            Ok(ProviderKind::Groq) => "llama3-70b-8192".into(),
            Ok(ProviderKind::Gemini) => "gemini-1.5-pro".into(),
            _ => "gpt-4o".into(),
        }
    }

    fn env_key_name(&self) -> Option<&'static str> {
        match self.kind().ok()? {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Azure => Some("AZURE_OPENAI_API_KEY"),
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Model round-trips allowed per `send`
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Record completed exchanges in the journal
    #[serde(default)]
    pub memory: bool,

    /// Tool whose result ends the exchange
    #[serde(default = "default_handover_tool")]
    pub handover_tool: String,

    /// "drop" or "report"
    #[serde(default = "default_tool_failure")]
    pub tool_failure: String,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Use the available tools when they help answer the user.".into()
}
fn default_max_turns() -> u32 {
    8
}
fn default_handover_tool() -> String {
    "human".into()
}
fn default_tool_failure() -> String {
    "drop".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_turns: default_max_turns(),
            memory: false,
            handover_tool: default_handover_tool(),
            tool_failure: default_tool_failure(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Falls back to the provider key when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            api_key: None,
            base_url: None,
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "memory" or "sqlite"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite file; defaults to `~/.agentloom/vectors.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_search_k")]
    pub search_k: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_memory_backend() -> String {
    "memory".into()
}
fn default_search_k() -> usize {
    4
}
fn default_chunk_size() -> usize {
    100
}
fn default_chunk_overlap() -> usize {
    1
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            search_k: default_search_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl VectorStoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("vectors.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// "memory" or "file"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// JSONL file; defaults to `~/.agentloom/journal.jsonl`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
        }
    }
}

impl JournalConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("journal.jsonl"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// SQLite file for `get_knowledge` / `save_knowledge`; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentloom/config.toml).
    ///
    /// Environment variables override the file:
    /// - `AGENTLOOM_API_KEY` (highest priority), then the provider's own
    ///   variable (`OPENAI_API_KEY`, `AZURE_OPENAI_API_KEY`, `GROQ_API_KEY`,
    ///   `GEMINI_API_KEY`) when no key is configured
    /// - `AGENTLOOM_PROVIDER`, `AGENTLOOM_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(kind) = lookup("AGENTLOOM_PROVIDER") {
            self.provider.kind = kind;
        }
        if let Some(model) = lookup("AGENTLOOM_MODEL") {
            self.provider.model = Some(model);
        }
        if let Some(key) = lookup("AGENTLOOM_API_KEY") {
            self.provider.api_key = Some(key);
        } else if self.provider.api_key.is_none() {
            self.provider.api_key = self.provider.env_key_name().and_then(&lookup);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentloom")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.provider.kind()?;

        if kind == ProviderKind::Azure
            && (self.provider.azure_endpoint.is_none() || self.provider.azure_deployment.is_none())
        {
            return Err(ConfigError::ValidationError(
                "azure provider requires azure_endpoint and azure_deployment".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.retry_attempts == 0 {
            return Err(ConfigError::ValidationError("retry_attempts must be at least 1".into()));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError("max_turns must be at least 1".into()));
        }

        if !matches!(self.agent.tool_failure.as_str(), "drop" | "report") {
            return Err(ConfigError::ValidationError(format!(
                "unknown tool_failure policy '{}' (expected \"drop\" or \"report\")",
                self.agent.tool_failure
            )));
        }

        if !matches!(self.vector_store.backend.as_str(), "memory" | "sqlite") {
            return Err(ConfigError::ValidationError(format!(
                "unknown vector_store backend '{}'",
                self.vector_store.backend
            )));
        }

        if self.vector_store.chunk_size == 0 || self.vector_store.chunk_overlap >= self.vector_store.chunk_size {
            return Err(ConfigError::ValidationError(
                "chunk_overlap must be smaller than a non-zero chunk_size".into(),
            ));
        }

        if !matches!(self.journal.backend.as_str(), "memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "unknown journal backend '{}'",
                self.journal.backend
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for agentloom_core::Error {
    fn from(e: ConfigError) -> Self {
        agentloom_core::Error::Config { message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.kind, "openai");
        assert_eq!(config.agent.max_turns, 8);
        assert_eq!(config.vector_store.search_k, 4);
        assert_eq!(config.vector_store.chunk_size, 100);
        assert_eq!(config.vector_store.chunk_overlap, 1);
        assert_eq!(config.agent.handover_tool, "human");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.kind, config.provider.kind);
        assert_eq!(parsed.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[provider]
kind = "gemini"

[agent]
memory = true
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.model(), "gemini-1.5-pro");
        assert!(config.agent.memory);
        assert_eq!(config.agent.tool_failure, "drop");
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 1024);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.generation.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_turns_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.vector_store.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.journal.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.provider.kind = "anthropic".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn azure_requires_endpoint_and_deployment() {
        let mut config = AppConfig::default();
        config.provider.kind = "azure".into();
        assert!(config.validate().is_err());

        config.provider.azure_endpoint = Some("https://example.openai.azure.com".into());
        config.provider.azure_deployment = Some("gpt-4o".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider.kind, "openai");
    }

    #[test]
    fn load_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\ntool_failure = \"explode\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nkind=").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn generic_api_key_env_wins() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("from-file".into());
        config.apply_env(env(&[("AGENTLOOM_API_KEY", "generic"), ("OPENAI_API_KEY", "specific")]));
        assert_eq!(config.provider.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn provider_specific_key_used_when_unset() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("AGENTLOOM_PROVIDER", "groq"), ("GROQ_API_KEY", "gsk")]));
        assert_eq!(config.provider.kind, "groq");
        assert_eq!(config.provider.api_key.as_deref(), Some("gsk"));
        assert_eq!(config.provider.model(), "llama3-70b-8192");
    }

    #[test]
    fn model_env_override() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("AGENTLOOM_MODEL", "gpt-4o-mini")]));
        assert_eq!(config.provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn debug_redacts_keys() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".into());
        config.embedding.api_key = Some("sk-embed".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("sk-embed"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openai"));
        assert!(toml_str.contains("text-embedding-3-small"));
    }
}
