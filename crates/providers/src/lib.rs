//! Model transport implementations for AgentLoom.
//!
//! All adapters implement `agentloom_core::ModelTransport`. The builder
//! selects one from configuration.

pub mod builder;
pub mod embeddings;
pub mod gemini;
mod http;
pub mod openai_compat;
pub mod retry;

pub use builder::{build_embedder, build_transport};
pub use embeddings::OpenAiEmbedder;
pub use gemini::GeminiTransport;
pub use openai_compat::OpenAiCompatTransport;
pub use retry::RetryTransport;
