//! Key/value knowledge store behind the `get_knowledge` and
//! `save_knowledge` tools.

use agentloom_core::error::DependencyError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Named facts the agent can save and look up later.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, DependencyError>;

    /// Insert or overwrite.
    async fn put(&self, key: &str, value: &str) -> Result<(), DependencyError>;
}

#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DependencyError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DependencyError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(feature = "sqlite")]
pub use self::sqlite_store::SqliteKnowledgeStore;

#[cfg(feature = "sqlite")]
mod sqlite_store {
    use super::KnowledgeStore;
    use agentloom_core::error::DependencyError;
    use async_trait::async_trait;
    use sqlx::{Row, SqlitePool};
    use tracing::info;

    /// Knowledge persisted in a `knowledge(key PRIMARY KEY, value)` table.
    pub struct SqliteKnowledgeStore {
        pool: SqlitePool,
    }

    impl SqliteKnowledgeStore {
        pub async fn new(path: &str) -> Result<Self, DependencyError> {
            let store = Self::from_pool(crate::sqlite::connect(path).await?).await?;
            info!("SQLite knowledge store initialized at {path}");
            Ok(store)
        }

        pub async fn from_pool(pool: SqlitePool) -> Result<Self, DependencyError> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS knowledge (
                    key        TEXT PRIMARY KEY NOT NULL,
                    value      TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .map_err(|e| DependencyError::Migration(format!("knowledge table: {e}")))?;
            Ok(Self { pool })
        }
    }

    #[async_trait]
    impl KnowledgeStore for SqliteKnowledgeStore {
        fn name(&self) -> &str {
            "sqlite"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, DependencyError> {
            let row = sqlx::query("SELECT value FROM knowledge WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DependencyError::Query(format!("get: {e}")))?;
            row.map(|r| r.try_get::<String, _>("value"))
                .transpose()
                .map_err(|e| DependencyError::Query(format!("value column: {e}")))
        }

        async fn put(&self, key: &str, value: &str) -> Result<(), DependencyError> {
            sqlx::query(
                r#"
                INSERT INTO knowledge (key, value, updated_at) VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| DependencyError::Storage(format!("put: {e}")))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(store: &dyn KnowledgeStore) {
        assert_eq!(store.get("favorite_color").await.unwrap(), None);

        store.put("favorite_color", "blue").await.unwrap();
        assert_eq!(store.get("favorite_color").await.unwrap().as_deref(), Some("blue"));

        store.put("favorite_color", "green").await.unwrap();
        assert_eq!(store.get("favorite_color").await.unwrap().as_deref(), Some("green"));
    }

    #[tokio::test]
    async fn in_memory_get_put_overwrite() {
        exercise(&InMemoryKnowledgeStore::new()).await;
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn sqlite_get_put_overwrite() {
        let store = SqliteKnowledgeStore::new("sqlite::memory:").await.unwrap();
        exercise(&store).await;
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn sqlite_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.db");
        let path = path.to_str().unwrap();

        SqliteKnowledgeStore::new(path).await.unwrap().put("k", "v").await.unwrap();
        let reopened = SqliteKnowledgeStore::new(path).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
