//! Error types for the AgentLoom domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what
//! callers of the conversation loop see.

use thiserror::Error;

/// The top-level error type for all AgentLoom operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model transport errors (fatal to the current exchange) ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Loop liveness bound ---
    #[error("Conversation exceeded the maximum of {max_turns} model turns")]
    MaxTurnsExceeded { max_turns: u32 },

    // --- Storage / embedding collaborators ---
    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    // --- Multi-agent workflows ---
    #[error("Workflow error: {0}")]
    Workflow(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The model backend was unreachable or answered with something unusable.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Transport not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the storage and embedding collaborators.
#[derive(Debug, Clone, Error)]
pub enum DependencyError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}
