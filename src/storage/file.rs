// ABOUTME: File-backed key-value store writing one JSON file per key
// ABOUTME: Writes go to a temporary file first and are renamed into place atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::KeyValueStore;
use crate::errors::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Key-value store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create storage directory {}: {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self { dir })
    }

    /// Directory holding the value files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!("Failed to read {key}: {e}"))),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        let target = self.path_for(key);
        let suffix: u32 = rand::random();
        let tmp = target.with_extension(format!("json.{suffix:08x}.tmp"));

        fs::write(&tmp, value)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {key}: {e}")))?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::storage(format!("Failed to commit {key}: {e}")));
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(format!("Failed to remove {key}: {e}"))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
