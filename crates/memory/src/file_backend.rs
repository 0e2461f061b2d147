//! File-based conversation journal — persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded `MemoryEntry` (`{user, assistant,
//! recorded_at}`). The file is loaded once at open; every append is written
//! through to disk before it becomes visible to readers.
//!
//! Default location: `~/.agentloom/journal.jsonl`

use agentloom_core::error::DependencyError;
use agentloom_core::journal::{JournalSnapshot, MemoryEntry, MemoryJournal};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::journal::JournalState;

/// A journal persisted as JSONL.
pub struct FileJournal {
    path: PathBuf,
    state: RwLock<JournalState>,
}

impl FileJournal {
    /// Open the journal at `path`, loading existing entries.
    ///
    /// A missing file starts an empty journal (the file is created on first
    /// append). Corrupted lines are skipped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DependencyError> {
        let path = path.into();
        let entries = Self::load_from_disk(&path)?;
        debug!(path = %path.display(), count = entries.len(), "File journal loaded");
        Ok(Self {
            path,
            state: RwLock::new(JournalState::from_entries(entries)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Result<Vec<MemoryEntry>, DependencyError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DependencyError::Storage(format!(
                    "Failed to read journal {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(number, line)| match serde_json::from_str::<MemoryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(line = number + 1, error = %e, "Skipping corrupted journal entry");
                    None
                }
            })
            .collect())
    }

    async fn ensure_parent(&self) -> Result<(), DependencyError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DependencyError::Storage(format!("Failed to create journal directory: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryJournal for FileJournal {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, entry: MemoryEntry) -> Result<(), DependencyError> {
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| DependencyError::Storage(format!("Failed to serialize journal entry: {e}")))?;
        line.push('\n');

        // Holding the write lock across the disk write keeps file order and
        // snapshot order identical.
        let mut state = self.state.write().await;
        self.ensure_parent().await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DependencyError::Storage(format!("Failed to open journal file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| DependencyError::Storage(format!("Failed to write journal file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| DependencyError::Storage(format!("Failed to flush journal file: {e}")))?;

        state.push(entry);
        Ok(())
    }

    async fn snapshot(&self) -> Result<JournalSnapshot, DependencyError> {
        Ok(self.state.read().await.snapshot())
    }

    async fn clear(&self) -> Result<(), DependencyError> {
        let mut state = self.state.write().await;
        match tokio::fs::write(&self.path, b"").await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DependencyError::Storage(format!("Failed to truncate journal file: {e}"))),
        }
        state.reset();
        Ok(())
    }
}
