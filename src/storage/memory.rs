// ABOUTME: In-memory key-value store used for tests and ephemeral sessions
// ABOUTME: Supports injected write failures to exercise persistence-fault paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::KeyValueStore;
use crate::errors::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

/// In-memory store; clones share the same underlying map
///
/// Nothing survives the process. Use [`InMemoryStore::set_fail_writes`] to
/// simulate a device whose storage rejects writes, or
/// [`InMemoryStore::set_fail_key`] to reject writes to a single key.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_item`/`remove_item` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes to `key` fail (or succeed again)
    pub fn set_fail_key(&self, key: &str, fail: bool) {
        let mut keys = self.failing_keys.lock().unwrap_or_else(PoisonError::into_inner);
        if fail {
            keys.insert(key.to_owned());
        } else {
            keys.remove(key);
        }
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self, key: &str) -> AppResult<()> {
        let key_fails = self
            .failing_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key);
        if key_fails || self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!(
                "injected write failure for key {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_writable(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        self.check_writable(key)?;
        self.entries.write().await.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.set_item("k", "v").await.unwrap();
        assert_eq!(other.get_item("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_previous_value() {
        let store = InMemoryStore::new();
        store.set_item("k", "old").await.unwrap();
        store.set_fail_writes(true);
        assert!(store.set_item("k", "new").await.is_err());
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("old"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_key_leaves_other_keys_writable() {
        let store = InMemoryStore::new();
        store.set_fail_key("broken", true);
        assert!(store.set_item("broken", "v").await.is_err());
        store.set_item("fine", "v").await.unwrap();

        store.set_fail_key("broken", false);
        store.set_item("broken", "v").await.unwrap();
        assert_eq!(store.write_count(), 2);
    }
}
