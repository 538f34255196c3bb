//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

/// SQLite-backed settings store implementation
///
/// Provides persistent key-value storage for app credentials, tokens, and
/// the selected-folder setting. One row per key; writes upsert.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs want forward slashes even on Windows
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::init_schema(&pool).await?;

        debug!(path = ?db_path, "Initialized settings store");

        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    async fn set_raw(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, value_type)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, value_type = excluded.value_type
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to write setting: {}", e)))?;

        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read setting: {}", e)))?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_raw(key, value, "string").await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_raw(key).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_raw(key, &value.to_string(), "i64").await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        let value = self.get_raw(key).await?;
        match value {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|e| BridgeError::OperationFailed(format!("Corrupt i64 setting: {}", e))),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to delete setting: {}", e)))?;

        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_round_trip() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("client_id", "abc-123").await.unwrap();
        assert_eq!(
            store.get_string("client_id").await.unwrap(),
            Some("abc-123".to_string())
        );

        // Overwrite
        store.set_string("client_id", "def-456").await.unwrap();
        assert_eq!(
            store.get_string("client_id").await.unwrap(),
            Some("def-456".to_string())
        );
    }

    #[tokio::test]
    async fn test_i64_round_trip() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_i64("expiry", 1_700_000_000).await.unwrap();
        assert_eq!(
            store.get_i64("expiry").await.unwrap(),
            Some(1_700_000_000)
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        assert_eq!(store.get_string("missing").await.unwrap(), None);
        assert!(!store.has_key("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("token", "value").await.unwrap();
        store.delete("token").await.unwrap();
        assert_eq!(store.get_string("token").await.unwrap(), None);

        // Deleting again succeeds
        store.delete("token").await.unwrap();
    }
}
