// ABOUTME: Read cache for backend query results with stale and garbage-collection windows
// ABOUTME: LRU-bounded, persisted as one snapshot through the key-value store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Query Cache
//!
//! Keeps the last known result of each read query so screens have data while
//! offline. An entry younger than `stale_time` is [`CacheLookup::Fresh`]; an
//! older one is still served as [`CacheLookup::Stale`] until `gc_time`, after
//! which it is dropped. Slow-changing queries can carry their own stale window
//! ([`QueryCache::set_with_stale_time`]); such an entry is never collected
//! before that window has passed.
//!
//! Delivered writes mark the queries they affect stale by key prefix
//! ([`QueryCache::invalidate_prefix`]), so screens refetch once online.

use crate::constants::{cache, storage_keys};
use crate::errors::{AppError, AppResult};
use crate::storage::{read_json, write_json, JsonRead, KeyValueStore};
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Cache timing and capacity settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which an entry is served as stale
    pub stale_time: Duration,
    /// Age after which an entry is dropped
    pub gc_time: Duration,
    /// Maximum number of cached queries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(cache::STALE_TIME_SECS),
            gc_time: Duration::from_secs(cache::GC_TIME_SECS),
            max_entries: cache::MAX_ENTRIES,
        }
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// Within the stale window; no refetch needed
    Fresh(T),
    /// Usable but should be refetched when online
    Stale(T),
    /// Nothing cached, or the entry was collected
    Miss,
}

impl<T> CacheLookup<T> {
    /// The cached value, fresh or stale
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedQuery {
    key: String,
    data: serde_json::Value,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stale_time: Option<Duration>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    invalidated: bool,
}

/// LRU cache of query results
pub struct QueryCache {
    entries: RwLock<LruCache<String, CachedQuery>>,
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
}

impl QueryCache {
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(cache::MAX_ENTRIES) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Empty cache persisting through `store`
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            store,
            config,
        }
    }

    /// Cache `value` for `key` as fetched now
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `value` cannot be encoded
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_at(key, value, Utc::now()).await
    }

    /// Cache `value` for `key` as fetched at `updated_at`
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `value` cannot be encoded
    pub async fn set_at<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.insert(key, value, updated_at, None).await
    }

    /// Cache `value` for `key` with its own stale window instead of the configured one
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `value` cannot be encoded
    pub async fn set_with_stale_time<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        stale_time: Duration,
    ) -> AppResult<()> {
        self.insert(key, value, Utc::now(), Some(stale_time)).await
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        updated_at: DateTime<Utc>,
        stale_time: Option<Duration>,
    ) -> AppResult<()> {
        let data = serde_json::to_value(value)
            .map_err(|e| AppError::serialization(format!("Failed to encode query {key}: {e}")))?;
        self.entries.write().await.push(
            key.to_owned(),
            CachedQuery {
                key: key.to_owned(),
                data,
                updated_at,
                stale_time,
                invalidated: false,
            },
        );
        Ok(())
    }

    /// Look up `key`
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the cached value does not decode as `T`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<CacheLookup<T>> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get(key) else {
            return Ok(CacheLookup::Miss);
        };

        if self.is_expired(entry, now) {
            entries.pop(key);
            return Ok(CacheLookup::Miss);
        }
        let fresh = !entry.invalidated && age_of(entry, now) < self.stale_time_of(entry);

        let value = serde_json::from_value(entry.data.clone())
            .map_err(|e| AppError::serialization(format!("Cached query {key} is unreadable: {e}")))?;
        drop(entries);

        if fresh {
            Ok(CacheLookup::Fresh(value))
        } else {
            Ok(CacheLookup::Stale(value))
        }
    }

    /// Mark `key` stale so the next read refetches; returns whether it was cached
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.get_mut(key).is_some_and(|entry| {
            entry.invalidated = true;
            true
        })
    }

    /// Mark every entry whose key starts with `prefix` stale; returns how many
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                marked += 1;
            }
        }
        drop(entries);
        if marked > 0 {
            debug!(prefix, marked, "Invalidated cached queries");
        }
        marked
    }

    /// Drop every entry whose key starts with `prefix`
    pub async fn remove_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let keys: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    /// Drop entries older than `gc_time`
    pub async fn collect_garbage(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        drop(entries);
        if !expired.is_empty() {
            debug!(removed = expired.len(), "Collected expired query cache entries");
        }
        expired.len()
    }

    /// Number of cached queries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is cached
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Write the live entries to storage, least recently used first
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the snapshot cannot be written
    pub async fn persist(&self) -> AppResult<()> {
        self.collect_garbage().await;
        let snapshot: Vec<CachedQuery> = self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .map(|(_, entry)| entry.clone())
            .collect();
        write_json(self.store.as_ref(), storage_keys::QUERY_CACHE, &snapshot).await?;
        debug!(entries = snapshot.len(), "Query cache persisted");
        Ok(())
    }

    /// Load the persisted snapshot, skipping entries past `gc_time`
    ///
    /// An unreadable snapshot is discarded. Returns the number of entries restored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read
    pub async fn restore(&self) -> AppResult<usize> {
        let snapshot: Vec<CachedQuery> =
            match read_json(self.store.as_ref(), storage_keys::QUERY_CACHE).await? {
                JsonRead::Missing => return Ok(0),
                JsonRead::Value(snapshot) => snapshot,
                JsonRead::Corrupt { error, .. } => {
                    warn!(error = %error, "Persisted query cache is unreadable, discarding it");
                    self.store.remove_item(storage_keys::QUERY_CACHE).await?;
                    return Ok(0);
                }
            };

        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let mut restored = 0;
        for entry in snapshot {
            if !self.is_expired(&entry, now) {
                entries.push(entry.key.clone(), entry);
                restored += 1;
            }
        }
        drop(entries);
        debug!(restored, "Query cache restored");
        Ok(restored)
    }

    fn stale_time_of(&self, entry: &CachedQuery) -> Duration {
        entry.stale_time.unwrap_or(self.config.stale_time)
    }

    fn is_expired(&self, entry: &CachedQuery, now: DateTime<Utc>) -> bool {
        age_of(entry, now) >= self.config.gc_time.max(self.stale_time_of(entry))
    }
}

fn age_of(entry: &CachedQuery, now: DateTime<Utc>) -> Duration {
    (now - entry.updated_at).to_std().unwrap_or(Duration::ZERO)
}
