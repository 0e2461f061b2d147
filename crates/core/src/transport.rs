//! Model transport — the capability every LLM backend exposes to the loop.
//!
//! Backends differ in request and response shape. Instead of subclassing per
//! provider, each adapter implements [`ModelTransport`]: one call that sends
//! the transcript and returns the raw JSON body, plus three pure accessors
//! that interpret that body. The conversation loop is written once against
//! this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TransportError;
use crate::message::{Message, ToolCall};

/// Which request/response family a transport speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Azure,
    Groq,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Groq => "groq",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" | "azure_openai" => Ok(Self::Azure),
            "groq" => Ok(Self::Groq),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!("unknown provider kind '{other}'")),
        }
    }
}

/// Sampling parameters passed on every model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// One model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRequest {
    /// The model to use (e.g., "gpt-4o-mini", "gemini-1.5-flash")
    pub model: String,

    /// The full transcript so far
    pub messages: Vec<Message>,

    /// Provider-shaped tool declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,

    #[serde(default)]
    pub generation: GenerationConfig,
}

/// The provider's response body, uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResponse {
    pub body: serde_json::Value,
}

impl RawResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }
}

impl From<serde_json::Value> for RawResponse {
    fn from(body: serde_json::Value) -> Self {
        Self::new(body)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The capability the conversation loop drives.
///
/// `send_raw` is the only I/O. The remaining methods are pure functions of
/// the response and must agree with each other: when `is_finished` is true
/// the loop takes `extract_text` as the answer, otherwise it executes
/// `extract_tool_calls`.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// A human-readable name for this transport (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Which declaration shape this transport expects.
    fn kind(&self) -> ProviderKind;

    /// The model this transport is configured for.
    fn model(&self) -> &str;

    /// Send the transcript and return the raw response body.
    async fn send_raw(&self, request: TransportRequest) -> std::result::Result<RawResponse, TransportError>;

    /// Whether the response is a final answer rather than a tool request.
    fn is_finished(&self, response: &RawResponse) -> bool;

    /// Tool calls requested by the response, in emitted order.
    fn extract_tool_calls(&self, response: &RawResponse) -> std::result::Result<Vec<ToolCall>, TransportError>;

    /// The response text (empty when there is none).
    fn extract_text(&self, response: &RawResponse) -> String;

    /// Token usage, when the provider reports it.
    fn usage(&self, _response: &RawResponse) -> Option<Usage> {
        None
    }
}
