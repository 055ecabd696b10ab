// ABOUTME: Storage factory for configuration-based backend selection
// ABOUTME: Opens the in-memory, file or SQLite key-value store named in the config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::file::FileStore;
use super::memory::InMemoryStore;
use super::KeyValueStore;
use crate::config::{StorageBackend, StorageConfig};
use crate::errors::AppResult;
use std::sync::Arc;
use tracing::{info, warn};

/// Open the store selected by `config`
///
/// Without the `sqlite` feature a `SQLite` request falls back to the file
/// backend in the same directory.
///
/// # Errors
///
/// Returns a storage error if the backend cannot be opened
pub async fn open_store(config: &StorageConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; pending writes will not survive a restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::File => {
            info!(dir = %config.data_dir.display(), "Initializing file storage");
            Ok(Arc::new(FileStore::open(&config.data_dir).await?))
        }
        StorageBackend::Sqlite => open_sqlite(config).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &StorageConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    use crate::constants::defaults;

    tokio::fs::create_dir_all(&config.data_dir).await?;
    let path = config.data_dir.join(defaults::SQLITE_FILE_NAME);
    info!(path = %path.display(), "Initializing SQLite storage");
    Ok(Arc::new(super::sqlite::SqliteStore::open(&path).await?))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(config: &StorageConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    warn!("SQLite storage requested but the sqlite feature is disabled. Using file storage instead.");
    Ok(Arc::new(FileStore::open(&config.data_dir).await?))
}
