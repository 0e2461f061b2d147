//! # AgentLoom Core
//!
//! Domain types, traits, and error definitions for the AgentLoom
//! tool-orchestrated conversation runtime. This crate defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the conversation loop is a trait here
//! ([`ModelTransport`], [`MemoryJournal`], [`Embedder`], [`RecordStorage`]).
//! Implementations live in their respective crates, so backends are chosen
//! at construction and tests substitute scripted stubs.

pub mod embedding;
pub mod error;
pub mod event;
pub mod journal;
pub mod message;
pub mod tool;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use embedding::{
    Document, Embedder, EmbeddingRecord, RecordFilter, RecordStorage, ScoredRecord, SimilaritySearch,
    metadata_equals,
};
pub use error::{DependencyError, Error, Result, ToolError, TransportError};
pub use event::{DomainEvent, EventBus};
pub use journal::{JournalSnapshot, MemoryEntry, MemoryJournal};
pub use message::{Conversation, ConversationId, Message, Role, ToolCall};
pub use tool::{FnTool, Tool, ToolDeclaration, ToolOutput, ToolRegistry, ToolResult};
pub use transport::{GenerationConfig, ModelTransport, ProviderKind, RawResponse, TransportRequest, Usage};
