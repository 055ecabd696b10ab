// ABOUTME: Durable key-value storage abstraction for queue and cache persistence
// ABOUTME: Pluggable backends (in-memory, JSON files, SQLite) behind one async trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Durable Storage
//!
//! The queue persists its whole state under a handful of string keys, the way
//! a mobile client uses its async key-value store. Each backend stores opaque
//! string values; JSON encoding happens in [`read_json`] and [`write_json`].

/// Storage factory for configuration-based backend selection
pub mod factory;
/// One-file-per-key JSON storage
pub mod file;
/// In-memory storage with fault injection for tests
pub mod memory;
/// `SQLite` key-value table
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::errors::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Async key-value store holding string values
///
/// An absent key reads as `None`. Implementations must make `set_item`
/// atomic per key: a reader never observes a partially written value.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove `key`; removing an absent key succeeds
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written
    async fn remove_item(&self, key: &str) -> AppResult<()>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Outcome of reading a JSON value that may be missing or unreadable
#[derive(Debug)]
pub enum JsonRead<T> {
    /// Key absent
    Missing,
    /// Value decoded
    Value(T),
    /// Value present but not decodable; carries the raw text
    Corrupt {
        /// Raw stored text
        raw: String,
        /// Decoder message
        error: String,
    },
}

/// Read and decode the JSON value stored under `key`
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read; undecodable values
/// are reported as [`JsonRead::Corrupt`] instead of an error.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> AppResult<JsonRead<T>> {
    let Some(raw) = store.get_item(key).await? else {
        return Ok(JsonRead::Missing);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(JsonRead::Value(value)),
        Err(e) => Ok(JsonRead::Corrupt {
            raw,
            error: e.to_string(),
        }),
    }
}

/// Encode `value` as JSON and store it under `key`
///
/// # Errors
///
/// Returns a serialization error if encoding fails or a storage error if the
/// backend cannot be written
pub async fn write_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> AppResult<()> {
    let encoded = serde_json::to_string(value)
        .map_err(|e| AppError::serialization(format!("Failed to encode {key}: {e}")))?;
    store.set_item(key, &encoded).await
}
