// ABOUTME: Composition root wiring the mutation queue to connectivity transitions
// ABOUTME: Replays the queue on reconnect and routes UI writes to the backend or the queue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Offline Sync Service
//!
//! [`OfflineSync`] owns the queue, the connectivity monitor and the background
//! tasks that connect them. It is constructed explicitly and passed to
//! whatever needs it; there is no process-wide instance.
//!
//! Writes reach the backend in submission order: while earlier writes are
//! still queued, an online submit joins the queue behind them instead of
//! overtaking them.

use crate::cache::{CacheConfig, QueryCache};
use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityMonitor, ReachabilityProbe};
use crate::errors::{AppError, RemoteError};
use crate::models::{Mutation, QueuedMutation};
use crate::queue::{MutationQueue, QueueEvent, SyncOutcome};
use crate::remote::http_client::{initialize_shared_client, shared_client};
use crate::remote::{HttpWriteApi, StaticToken};
use crate::storage::factory::open_store;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a submitted write was handled
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The backend accepted the write
    Sent,
    /// Offline: the write was queued for later delivery
    Queued(QueuedMutation),
}

/// Failure of [`OfflineSync::submit`]
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The payload failed validation and was neither sent nor queued
    #[error(transparent)]
    Invalid(#[from] AppError),
    /// Online, and the backend call failed; nothing was queued
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Offline-first write path for the fitness client
pub struct OfflineSync {
    queue: Arc<MutationQueue>,
    connectivity: Arc<ConnectivityMonitor>,
    probe: Option<ReachabilityProbe>,
    cache: Option<Arc<QueryCache>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OfflineSync {
    /// Service over an already loaded queue and a monitor fed by the caller
    #[must_use]
    pub fn new(queue: Arc<MutationQueue>, connectivity: Arc<ConnectivityMonitor>) -> Self {
        Self {
            queue,
            connectivity,
            probe: None,
            cache: None,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Persist `cache` on shutdown
    ///
    /// Invalidation on delivery is set up on the queue with
    /// [`MutationQueue::with_cache`].
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the full stack from configuration: storage, HTTP client, query cache, queue and probe
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be opened or read
    pub async fn from_config(config: &SyncConfig) -> Result<Self, AppError> {
        let store = open_store(&config.storage).await?;
        initialize_shared_client(config.api.timeout_secs, config.api.connect_timeout_secs);
        let remote = Arc::new(HttpWriteApi::new(
            &config.api.base_url,
            Arc::new(StaticToken(config.api.access_token.clone())),
        ));

        let cache = Arc::new(QueryCache::new(Arc::clone(&store), CacheConfig::default()));
        cache.restore().await?;
        let queue = Arc::new(
            MutationQueue::load(store, remote, config.queue.clone())
                .await?
                .with_cache(Arc::clone(&cache)),
        );

        let mut service =
            Self::new(queue, Arc::new(ConnectivityMonitor::default())).with_cache(cache);
        service.probe = config
            .connectivity
            .probe_interval
            .map(|interval| {
                ReachabilityProbe::new(
                    shared_client().clone(),
                    config.api.base_url.clone(),
                    interval,
                )
            });
        Ok(service)
    }

    /// Start listening for connectivity transitions
    ///
    /// Each offline to online transition runs one sync pass. If the monitor
    /// is online now and writes are pending, a pass runs right away. Calling
    /// `start` again while running has no effect.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            debug!("Offline sync already started");
            return;
        }

        // Taken together so a transition racing with startup triggers exactly one pass
        let (online_at_start, transitions) = self.connectivity.snapshot_and_subscribe();
        tasks.push(tokio::spawn(run_listener(
            Arc::clone(&self.queue),
            Arc::clone(&self.connectivity),
            online_at_start,
            transitions,
        )));
        if let Some(probe) = self.probe.clone() {
            tasks.push(probe.spawn(Arc::clone(&self.connectivity)));
        }
        info!(online = self.connectivity.is_online(), "Offline sync started");
    }

    /// Stop the listener and the probe, then persist the query cache
    ///
    /// Queued writes are already persisted.
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            task.abort();
        }
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.persist().await {
                warn!(error = %e, "Failed to persist query cache on shutdown");
            }
        }
        info!("Offline sync stopped");
    }

    /// Send a write now if online, otherwise queue it
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Invalid`] for a payload that fails validation and
    /// [`SubmitError::Remote`] when an online write fails
    pub async fn submit(&self, mutation: impl Into<Mutation>) -> Result<Submission, SubmitError> {
        let mutation = mutation.into();
        mutation.validate()?;

        if !self.connectivity.is_online() {
            return Ok(Submission::Queued(self.queue.enqueue(mutation).await));
        }

        if self.queue.is_syncing() || !self.queue.is_empty().await {
            debug!(mutation.kind = %mutation.kind(), "Earlier writes pending, queueing behind them");
            let record = self.queue.enqueue(mutation).await;
            spawn_sync_after_current(Arc::clone(&self.queue));
            return Ok(Submission::Queued(record));
        }

        let kind = mutation.kind();
        match self.queue.send_direct(&mutation).await {
            Ok(()) => {
                debug!(mutation.kind = %kind, "Write sent directly");
                Ok(Submission::Sent)
            }
            Err(e) => {
                warn!(mutation.kind = %kind, error = %e, "Direct write failed");
                Err(e.into())
            }
        }
    }

    /// Run a sync pass now, regardless of connectivity
    pub async fn sync_now(&self) -> SyncOutcome {
        self.queue.sync_queue().await
    }

    /// Current connectivity state
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Shared queue
    #[must_use]
    pub const fn queue(&self) -> &Arc<MutationQueue> {
        &self.queue
    }

    /// Query cache persisted on shutdown, if any
    #[must_use]
    pub const fn cache(&self) -> Option<&Arc<QueryCache>> {
        self.cache.as_ref()
    }

    /// Shared connectivity monitor
    #[must_use]
    pub const fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    /// Receive queue and connectivity events from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.queue.subscribe()
    }
}

impl Drop for OfflineSync {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

/// Run a pass that includes everything queued so far, waiting out one in flight
fn spawn_sync_after_current(queue: Arc<MutationQueue>) {
    tokio::spawn(async move {
        while matches!(queue.sync_queue().await, SyncOutcome::AlreadyRunning) {
            queue.wait_idle().await;
        }
    });
}

async fn run_listener(
    queue: Arc<MutationQueue>,
    connectivity: Arc<ConnectivityMonitor>,
    online_at_start: bool,
    mut transitions: broadcast::Receiver<bool>,
) {
    if online_at_start && !queue.is_empty().await {
        info!("Pending writes found at startup, syncing");
        queue.sync_queue().await;
    }

    loop {
        match transitions.recv().await {
            Ok(online) => {
                queue.publish(QueueEvent::ConnectivityChanged { online });
                if online {
                    info!("Connectivity restored, syncing pending writes");
                    queue.sync_queue().await;
                } else {
                    info!("Connectivity lost, writes will be queued");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed connectivity transitions");
                if connectivity.is_online() {
                    queue.sync_queue().await;
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}
