//! In-memory conversation journal.
//!
//! Entries live in an `Arc<Vec<_>>` that is copied on write, so snapshots
//! handed to readers stay valid and unchanged while appends continue.

use agentloom_core::error::DependencyError;
use agentloom_core::journal::{JournalSnapshot, MemoryEntry, MemoryJournal};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Versioned, copy-on-write entry list shared by the journal backends.
#[derive(Debug, Default)]
pub(crate) struct JournalState {
    version: u64,
    entries: Arc<Vec<MemoryEntry>>,
}

impl JournalState {
    pub(crate) fn from_entries(entries: Vec<MemoryEntry>) -> Self {
        Self {
            version: 0,
            entries: Arc::new(entries),
        }
    }

    pub(crate) fn push(&mut self, entry: MemoryEntry) {
        Arc::make_mut(&mut self.entries).push(entry);
        self.version += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.entries = Arc::new(Vec::new());
        self.version += 1;
    }

    pub(crate) fn snapshot(&self) -> JournalSnapshot {
        JournalSnapshot::new(self.version, Arc::clone(&self.entries))
    }
}

/// A journal that lives for the process lifetime.
#[derive(Default)]
pub struct InMemoryJournal {
    state: RwLock<JournalState>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing entries.
    pub fn with_entries(entries: Vec<MemoryEntry>) -> Self {
        Self {
            state: RwLock::new(JournalState::from_entries(entries)),
        }
    }
}

#[async_trait]
impl MemoryJournal for InMemoryJournal {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, entry: MemoryEntry) -> Result<(), DependencyError> {
        self.state.write().await.push(entry);
        Ok(())
    }

    async fn snapshot(&self) -> Result<JournalSnapshot, DependencyError> {
        Ok(self.state.read().await.snapshot())
    }

    async fn clear(&self) -> Result<(), DependencyError> {
        self.state.write().await.reset();
        Ok(())
    }
}
