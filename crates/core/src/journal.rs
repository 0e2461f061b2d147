//! Memory journal — distilled conversation memory that outlives a session.
//!
//! Each completed exchange can be appended as a [`MemoryEntry`]. Readers never
//! see a live collection: they get a [`JournalSnapshot`], an immutable,
//! versioned view that stays valid while writers keep appending.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DependencyError;

/// One remembered exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    #[serde(rename = "user")]
    pub user_message: String,

    #[serde(rename = "assistant")]
    pub agent_message: String,

    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(user_message: impl Into<String>, agent_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            agent_message: agent_message.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// An immutable view of the journal at some version.
#[derive(Debug, Clone, Default)]
pub struct JournalSnapshot {
    /// Incremented on every append or clear
    pub version: u64,
    entries: Arc<Vec<MemoryEntry>>,
}

impl JournalSnapshot {
    pub fn new(version: u64, entries: Arc<Vec<MemoryEntry>>) -> Self {
        Self { version, entries }
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the entries as a block for a system prompt, or `None` when
    /// there is nothing to remember.
    pub fn to_prompt_block(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let mut block = String::from("Conversation memory:");
        for entry in self.entries.iter() {
            block.push_str("\nUser: ");
            block.push_str(&entry.user_message);
            block.push_str("\nAssistant: ");
            block.push_str(&entry.agent_message);
        }
        Some(block)
    }
}

/// Append-only store of [`MemoryEntry`] values.
///
/// Implementations serialize appends and hand out snapshots. They are shared
/// through `Arc` and injected where needed.
#[async_trait]
pub trait MemoryJournal: Send + Sync {
    /// Backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Append one entry.
    async fn append(&self, entry: MemoryEntry) -> std::result::Result<(), DependencyError>;

    /// The current contents as an immutable snapshot.
    async fn snapshot(&self) -> std::result::Result<JournalSnapshot, DependencyError>;

    /// Copy of all entries, oldest first.
    async fn read_all(&self) -> std::result::Result<Vec<MemoryEntry>, DependencyError> {
        Ok(self.snapshot().await?.entries().to_vec())
    }

    /// Remove every entry.
    async fn clear(&self) -> std::result::Result<(), DependencyError>;

    async fn len(&self) -> std::result::Result<usize, DependencyError> {
        Ok(self.snapshot().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_as_user_assistant() {
        let entry = MemoryEntry::new("hi", "hello");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["user"], "hi");
        assert_eq!(json["assistant"], "hello");
        assert!(json.get("recorded_at").is_some());
    }

    #[test]
    fn entry_without_timestamp_deserializes() {
        let entry: MemoryEntry = serde_json::from_str(r#"{"user":"a","assistant":"b"}"#).unwrap();
        assert_eq!(entry.user_message, "a");
        assert_eq!(entry.agent_message, "b");
    }

    #[test]
    fn empty_snapshot_renders_nothing() {
        assert!(JournalSnapshot::default().to_prompt_block().is_none());
    }

    #[test]
    fn snapshot_renders_pairs_in_order() {
        let snap = JournalSnapshot::new(
            2,
            Arc::new(vec![MemoryEntry::new("q1", "a1"), MemoryEntry::new("q2", "a2")]),
        );
        let block = snap.to_prompt_block().unwrap();
        assert_eq!(
            block,
            "Conversation memory:\nUser: q1\nAssistant: a1\nUser: q2\nAssistant: a2"
        );
    }
}
