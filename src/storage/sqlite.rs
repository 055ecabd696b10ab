// ABOUTME: SQLite-backed key-value store using a single upsert table
// ABOUTME: Alternative to file storage when the client already ships a database file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::KeyValueStore;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Key-value store backed by a `kv_store` table
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be opened or migrated
    pub async fn open(path: &Path) -> AppResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::storage(format!("Failed to open {}: {e}", path.display()))
            })?;
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be created
    pub async fn in_memory() -> AppResult<Self> {
        // Every connection to :memory: is its own database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .map_err(|e| AppError::storage(format!("Failed to open in-memory database: {e}")))?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> AppResult<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::storage(format!("Failed to create kv_store table: {e}")))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::storage(format!("Failed to read {key}: {e}")))?;
        row.map(|row| row.try_get("value"))
            .transpose()
            .map_err(|e| AppError::storage(format!("Failed to decode {key}: {e}")))
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = ?2,
                updated_at = ?3
            ",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::storage(format!("Failed to write {key}: {e}")))?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::storage(format!("Failed to remove {key}: {e}")))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
