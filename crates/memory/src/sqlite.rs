//! SQLite record storage.
//!
//! One table, `embeddings`, keyed by an autoincrement row id so scans come
//! back in insertion order:
//! - `content`  — unique text key
//! - `vector`   — little-endian f32 blob
//! - `metadata` — JSON text
//!
//! Inserts use `INSERT OR IGNORE`, so the first write of a content wins even
//! when two stores share the same database file.

use agentloom_core::embedding::{EmbeddingRecord, RecordFilter, RecordStorage};
use agentloom_core::error::DependencyError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Open (creating if needed) a SQLite pool at `path`.
///
/// `":memory:"`/`"sqlite::memory:"` gives an ephemeral database; it is held
/// on a single connection since each connection would otherwise see its own
/// empty database.
pub async fn connect(path: &str) -> Result<SqlitePool, DependencyError> {
    let in_memory = path.contains(":memory:");
    let url = if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{path}")
    };

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| DependencyError::Storage(format!("Invalid SQLite path: {e}")))?
        .create_if_missing(true)
        .journal_mode(if in_memory {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        })
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 4 })
        .connect_with(options)
        .await
        .map_err(|e| DependencyError::Storage(format!("Failed to open SQLite: {e}")))
}

/// Embedding records persisted in SQLite.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open the database at `path` and create the schema.
    pub async fn new(path: &str) -> Result<Self, DependencyError> {
        if let Some(parent) = std::path::Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
            && !path.contains(":memory:")
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DependencyError::Storage(format!("Failed to create {}: {e}", parent.display())))?;
        }
        let storage = Self::from_pool(connect(path).await?).await?;
        info!("SQLite vector storage initialized at {path}");
        Ok(storage)
    }

    /// Wrap an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DependencyError> {
        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    async fn run_migrations(&self) -> Result<(), DependencyError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS embeddings (
                iid       INTEGER PRIMARY KEY AUTOINCREMENT,
                content   TEXT UNIQUE NOT NULL,
                vector    BLOB NOT NULL,
                metadata  TEXT NOT NULL DEFAULT 'null'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DependencyError::Migration(format!("embeddings table: {e}")))?;

        debug!("SQLite vector migrations complete");
        Ok(())
    }

    fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
        vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<EmbeddingRecord, DependencyError> {
        let content: String = row
            .try_get("content")
            .map_err(|e| DependencyError::Query(format!("content column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("vector")
            .map_err(|e| DependencyError::Query(format!("vector column: {e}")))?;
        let metadata_json: String = row
            .try_get("metadata")
            .map_err(|e| DependencyError::Query(format!("metadata column: {e}")))?;

        let metadata = match serde_json::from_str(&metadata_json) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(content = %content, error = %e, "Unreadable record metadata, treating as null");
                serde_json::Value::Null
            }
        };

        Ok(EmbeddingRecord {
            content,
            vector: Self::blob_to_vector(&blob),
            metadata,
        })
    }
}

#[async_trait]
impl RecordStorage for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn lookup(&self, contents: &[String]) -> Result<Vec<Option<Vec<f32>>>, DependencyError> {
        let mut found = Vec::with_capacity(contents.len());
        for content in contents {
            let row = sqlx::query("SELECT vector FROM embeddings WHERE content = ?")
                .bind(content)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DependencyError::Query(format!("lookup: {e}")))?;

            let vector = match row {
                Some(row) => {
                    let blob: Vec<u8> = row
                        .try_get("vector")
                        .map_err(|e| DependencyError::Query(format!("vector column: {e}")))?;
                    Some(Self::blob_to_vector(&blob))
                }
                None => None,
            };
            found.push(vector);
        }
        Ok(found)
    }

    async fn insert(&self, records: Vec<EmbeddingRecord>) -> Result<usize, DependencyError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DependencyError::Storage(format!("begin: {e}")))?;

        let mut inserted = 0usize;
        for record in &records {
            let metadata = serde_json::to_string(&record.metadata)
                .map_err(|e| DependencyError::Storage(format!("metadata: {e}")))?;
            let result = sqlx::query("INSERT OR IGNORE INTO embeddings (content, vector, metadata) VALUES (?, ?, ?)")
                .bind(&record.content)
                .bind(Self::vector_to_blob(&record.vector))
                .bind(metadata)
                .execute(&mut *tx)
                .await
                .map_err(|e| DependencyError::Storage(format!("insert: {e}")))?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| DependencyError::Storage(format!("commit: {e}")))?;

        debug!(inserted, offered = records.len(), "Stored embedding records");
        Ok(inserted)
    }

    async fn scan(&self, filter: Option<&RecordFilter>) -> Result<Vec<EmbeddingRecord>, DependencyError> {
        let rows = sqlx::query("SELECT content, vector, metadata FROM embeddings ORDER BY iid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DependencyError::Query(format!("scan: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = Self::row_to_record(row)?;
            if filter.is_none_or(|f| f(&record)) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn count(&self) -> Result<usize, DependencyError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM embeddings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DependencyError::Query(format!("count: {e}")))?;
        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| DependencyError::Query(format!("count column: {e}")))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<(), DependencyError> {
        sqlx::query("DELETE FROM embeddings")
            .execute(&self.pool)
            .await
            .map_err(|e| DependencyError::Storage(format!("clear: {e}")))?;
        Ok(())
    }
}
