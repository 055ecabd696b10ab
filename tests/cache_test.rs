// ABOUTME: Integration tests for the persisted query cache
// ABOUTME: Snapshot restore across restarts, garbage collection and LRU bounds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors
#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trainsync::cache::{CacheConfig, CacheLookup, QueryCache};
use trainsync::constants::storage_keys;
use trainsync::storage::memory::InMemoryStore;
use trainsync::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PlanSummary {
    id: u64,
    name: String,
}

fn summaries() -> Vec<PlanSummary> {
    vec![
        PlanSummary {
            id: 1,
            name: "Push".to_owned(),
        },
        PlanSummary {
            id: 2,
            name: "Pull".to_owned(),
        },
    ]
}

#[tokio::test]
async fn test_restore_brings_back_persisted_queries() {
    let store = InMemoryStore::new();
    let cache = QueryCache::new(Arc::new(store.clone()), CacheConfig::default());
    cache.set("trainings", &summaries()).await.unwrap();
    cache.set("exercises/category/2", &vec![7, 8]).await.unwrap();
    cache.persist().await.unwrap();

    let restarted = QueryCache::new(Arc::new(store), CacheConfig::default());
    assert_eq!(restarted.restore().await.unwrap(), 2);

    let lookup: CacheLookup<Vec<PlanSummary>> = restarted.get("trainings").await.unwrap();
    assert_eq!(lookup, CacheLookup::Fresh(summaries()));
}

#[tokio::test]
async fn test_restore_skips_entries_past_gc_time() {
    let store = InMemoryStore::new();
    let cache = QueryCache::new(Arc::new(store.clone()), CacheConfig::default());
    cache.set("recent", &1).await.unwrap();
    cache.persist().await.unwrap();

    // Rewrite the snapshot with one expired entry next to the fresh one
    let raw = store.get_item(storage_keys::QUERY_CACHE).await.unwrap().unwrap();
    let mut snapshot: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    let mut expired = snapshot[0].clone();
    expired["key"] = "expired".into();
    expired["updated_at"] = (Utc::now() - ChronoDuration::days(3)).to_rfc3339().into();
    snapshot.push(expired);
    store
        .set_item(
            storage_keys::QUERY_CACHE,
            &serde_json::to_string(&snapshot).unwrap(),
        )
        .await
        .unwrap();

    let restarted = QueryCache::new(Arc::new(store), CacheConfig::default());
    assert_eq!(restarted.restore().await.unwrap(), 1);
    let lookup: CacheLookup<u32> = restarted.get("expired").await.unwrap();
    assert_eq!(lookup, CacheLookup::Miss);
}

#[tokio::test]
async fn test_unreadable_snapshot_is_discarded() {
    let store = InMemoryStore::new();
    store
        .set_item(storage_keys::QUERY_CACHE, "not json")
        .await
        .unwrap();

    let cache = QueryCache::new(Arc::new(store.clone()), CacheConfig::default());
    assert_eq!(cache.restore().await.unwrap(), 0);
    assert!(cache.is_empty().await);
    assert_eq!(store.get_item(storage_keys::QUERY_CACHE).await.unwrap(), None);
}

#[tokio::test]
async fn test_least_recently_used_query_is_evicted() {
    let config = CacheConfig {
        max_entries: 2,
        ..CacheConfig::default()
    };
    let cache = QueryCache::new(Arc::new(InMemoryStore::new()), config);
    cache.set("a", &1).await.unwrap();
    cache.set("b", &2).await.unwrap();
    let _: CacheLookup<u32> = cache.get("a").await.unwrap();
    cache.set("c", &3).await.unwrap();

    assert_eq!(cache.len().await, 2);
    let evicted: CacheLookup<u32> = cache.get("b").await.unwrap();
    assert_eq!(evicted, CacheLookup::Miss);
    let kept: CacheLookup<u32> = cache.get("a").await.unwrap();
    assert_eq!(kept.into_value(), Some(1));
}

#[tokio::test]
async fn test_remove_prefix_and_garbage_collection() {
    let cache = QueryCache::new(Arc::new(InMemoryStore::new()), CacheConfig::default());
    cache.set("exercises/category/1", &1).await.unwrap();
    cache.set("exercises/category/2", &2).await.unwrap();
    cache.set("trainings", &3).await.unwrap();
    cache
        .set_at("old", &4, Utc::now() - ChronoDuration::hours(25))
        .await
        .unwrap();

    assert_eq!(cache.remove_prefix("exercises/").await, 2);
    assert_eq!(cache.collect_garbage().await, 1);
    assert_eq!(cache.len().await, 1);
}
