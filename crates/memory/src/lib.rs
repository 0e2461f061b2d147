//! Storage for AgentLoom: conversation journals, the vector store and its
//! record backends, text splitting and the knowledge key/value store.

pub mod file_backend;
pub mod in_memory;
pub mod journal;
pub mod knowledge;
pub mod splitter;
pub mod store;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file_backend::FileJournal;
pub use in_memory::InMemoryStorage;
pub use journal::InMemoryJournal;
pub use knowledge::{InMemoryKnowledgeStore, KnowledgeStore};
pub use splitter::TextSplitter;
pub use store::{TextMetadata, VectorStore};
pub use vector::{cosine_similarity, rank_by_similarity};

#[cfg(feature = "sqlite")]
pub use knowledge::SqliteKnowledgeStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
