// ABOUTME: Durable FIFO of writes that could not be sent, replayed when connectivity returns
// ABOUTME: Single-pass re-entrancy guard, snapshot-then-commit replay, optional dead lettering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Offline Mutation Queue
//!
//! [`MutationQueue`] is a write-through cache of pending writes:
//!
//! - the in-memory sequence is the working copy and changes first;
//! - every change is followed by a persist of the whole sequence under
//!   [`storage_keys::MUTATION_QUEUE`];
//! - a failed persist is logged and reported through [`MutationQueue::is_durable`]
//!   until the next successful persist of the same key. In that window a
//!   restart loses the unpersisted changes.
//!
//! Delivery is at least once. A crash after the backend confirmed a write but
//! before the pass committed replays that write on the next launch.
//!
//! A sync pass snapshots the queue, replays the snapshot one mutation at a
//! time in order, then commits: delivered (and dead-lettered) mutations are
//! removed, everything else keeps its relative order. Mutations enqueued while
//! the pass runs are not part of the snapshot and wait for the next pass.
//!
//! A mutation only leaves the pending list once it is delivered or its dead
//! letter has been persisted; if the dead-letter list cannot be written the
//! rejected mutation stays queued.

/// Failure policy and dead-letter records
pub mod dead_letter;
/// Queue events and sync reports
pub mod events;
/// Remote dispatch of a single mutation
mod replay;

pub use dead_letter::{DeadLetter, FailurePolicy};
pub use events::{QueueEvent, SyncOutcome, SyncReport};

use crate::cache::QueryCache;
use crate::constants::{defaults, storage_keys};
use crate::errors::{AppError, AppResult, RemoteError};
use crate::models::{Mutation, MutationId, MutationKind, QueuedMutation};
use crate::remote::RemoteWriteApi;
use crate::storage::{read_json, write_json, JsonRead, KeyValueStore};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, Notify};
use tracing::{debug, error, info, warn};

/// Queue behaviour settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Upper bound for one replay attempt; `None` waits indefinitely
    pub attempt_timeout: Option<Duration>,
    /// Treatment of terminal failures
    pub failure_policy: FailurePolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Some(Duration::from_secs(defaults::ATTEMPT_TIMEOUT_SECS)),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Default)]
struct QueueState {
    pending: Vec<QueuedMutation>,
    dead_letters: Vec<DeadLetter>,
}

/// Clears the syncing flag when the pass ends, including on cancellation
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
    idle: &'a Notify,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool, idle: &'a Notify) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, idle })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

/// Durable queue of pending writes
///
/// Share it behind an `Arc`; all methods take `&self`. The state lock is held
/// for in-memory changes and the persist that follows them, never across a
/// remote call, so persisted snapshots are written in the order the changes
/// happened.
pub struct MutationQueue {
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteWriteApi>,
    config: QueueConfig,
    state: Mutex<QueueState>,
    syncing: AtomicBool,
    idle: Notify,
    // Outcome of the last persist, per storage key
    pending_durable: AtomicBool,
    dead_letters_durable: AtomicBool,
    events: broadcast::Sender<QueueEvent>,
    cache: Option<Arc<QueryCache>>,
}

impl MutationQueue {
    /// Load the persisted queue and dead letters from `store`
    ///
    /// An absent key is an empty list. An unreadable value is copied to a
    /// `.corrupt` backup key and replaced by an empty list.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read at all
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteWriteApi>,
        config: QueueConfig,
    ) -> AppResult<Self> {
        let pending: Vec<QueuedMutation> =
            load_list(store.as_ref(), storage_keys::MUTATION_QUEUE).await?;
        let dead_letters: Vec<DeadLetter> =
            load_list(store.as_ref(), storage_keys::DEAD_LETTERS).await?;

        info!(
            storage = store.backend_name(),
            pending = pending.len(),
            dead_letters = dead_letters.len(),
            failure_policy = ?config.failure_policy,
            "Mutation queue loaded"
        );

        let (events, _) = broadcast::channel(defaults::EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            store,
            remote,
            config,
            state: Mutex::new(QueueState {
                pending,
                dead_letters,
            }),
            syncing: AtomicBool::new(false),
            idle: Notify::new(),
            pending_durable: AtomicBool::new(true),
            dead_letters_durable: AtomicBool::new(true),
            events,
            cache: None,
        })
    }

    /// Mark cached queries stale whenever a write they depend on is delivered
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Append a write to the queue and persist the queue
    ///
    /// Never fails: the record is in the in-memory queue as soon as this
    /// returns. A storage failure is logged and flips [`Self::is_durable`].
    pub async fn enqueue(&self, mutation: impl Into<Mutation>) -> QueuedMutation {
        let record = QueuedMutation::new(mutation.into());
        {
            let mut state = self.state.lock().await;
            state.pending.push(record.clone());
            self.persist_pending(&state.pending).await;
        }

        info!(
            mutation.id = %record.id,
            mutation.kind = %record.kind(),
            "Mutation queued for later delivery"
        );
        self.publish(QueueEvent::Queued {
            id: record.id.clone(),
            kind: record.kind(),
        });
        record
    }

    /// Replay the queued mutations once, in order
    ///
    /// Returns [`SyncOutcome::AlreadyRunning`] without doing anything when
    /// another pass is in flight.
    pub async fn sync_queue(&self) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing, &self.idle) else {
            debug!("Sync pass already running, skipping");
            return SyncOutcome::AlreadyRunning;
        };

        let snapshot = self.state.lock().await.pending.clone();
        if snapshot.is_empty() {
            return SyncOutcome::Completed(SyncReport::default());
        }
        info!(mutations = snapshot.len(), "Starting sync pass");

        let mut delivered: HashSet<MutationId> = HashSet::new();
        let mut rejected: Vec<DeadLetter> = Vec::new();

        for queued in &snapshot {
            match replay::dispatch_bounded(
                self.remote.as_ref(),
                &queued.mutation,
                self.config.attempt_timeout,
            )
            .await
            {
                Ok(()) => {
                    debug!(mutation.id = %queued.id, mutation.kind = %queued.kind(), "Mutation delivered");
                    delivered.insert(queued.id.clone());
                    self.invalidate_queries(queued.kind()).await;
                }
                Err(err) => self.record_failure(queued, &err, &mut rejected),
            }
        }

        let (report, rejected) = self.commit_pass(snapshot.len(), &delivered, rejected).await;

        info!(
            attempted = report.attempted,
            synced = report.synced,
            dead_lettered = report.dead_lettered,
            pending = report.pending,
            "Sync pass finished"
        );
        for letter in rejected {
            self.publish(QueueEvent::DeadLettered {
                id: letter.mutation.id.clone(),
                kind: letter.mutation.kind(),
                reason: letter.reason,
            });
        }
        self.publish(QueueEvent::SyncCompleted(report));
        SyncOutcome::Completed(report)
    }

    fn record_failure(&self, queued: &QueuedMutation, err: &RemoteError, rejected: &mut Vec<DeadLetter>) {
        let class = err.classification();
        if self.config.failure_policy.dead_letters(class) {
            warn!(
                mutation.id = %queued.id,
                mutation.kind = %queued.kind(),
                error = %err,
                "Mutation rejected by backend, moving to dead letters"
            );
            rejected.push(DeadLetter::new(queued.clone(), err));
        } else {
            warn!(
                mutation.id = %queued.id,
                mutation.kind = %queued.kind(),
                failure = ?class,
                error = %err,
                "Mutation replay failed, keeping it queued"
            );
        }
    }

    /// Apply a finished pass; returns the report and the dead letters actually recorded
    async fn commit_pass(
        &self,
        attempted: usize,
        delivered: &HashSet<MutationId>,
        rejected: Vec<DeadLetter>,
    ) -> (SyncReport, Vec<DeadLetter>) {
        let mut state = self.state.lock().await;

        // Dead letters are written before the pending list drops them, so a crash
        // in between duplicates a record instead of losing it.
        let recorded = if rejected.is_empty() {
            rejected
        } else {
            let mut letters = state.dead_letters.clone();
            letters.extend(rejected.iter().cloned());
            if self.persist_dead_letters(&letters).await {
                state.dead_letters = letters;
                rejected
            } else {
                warn!(
                    rejected = rejected.len(),
                    "Dead letters could not be stored, keeping rejected mutations queued"
                );
                Vec::new()
            }
        };

        let recorded_ids: HashSet<&MutationId> =
            recorded.iter().map(|letter| &letter.mutation.id).collect();
        state
            .pending
            .retain(|m| !delivered.contains(&m.id) && !recorded_ids.contains(&m.id));
        self.persist_pending(&state.pending).await;

        let report = SyncReport {
            attempted,
            synced: delivered.len(),
            dead_lettered: recorded.len(),
            pending: state.pending.len(),
        };
        drop(state);
        (report, recorded)
    }

    /// Copy of the pending mutations in replay order
    pub async fn pending(&self) -> Vec<QueuedMutation> {
        self.state.lock().await.pending.clone()
    }

    /// Number of pending mutations
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether nothing is pending
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }

    /// Copy of the dead-letter list, oldest first
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead_letters.clone()
    }

    /// Move a dead letter back to the tail of the queue
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no dead letter has this id
    pub async fn requeue_dead_letter(&self, id: &MutationId) -> AppResult<QueuedMutation> {
        let mut state = self.state.lock().await;
        let index = state
            .dead_letters
            .iter()
            .position(|letter| &letter.mutation.id == id)
            .ok_or_else(|| AppError::not_found(format!("no dead letter with id {id}")))?;

        let letter = state.dead_letters.remove(index);
        state.pending.push(letter.mutation.clone());
        self.persist_pending(&state.pending).await;
        self.persist_dead_letters(&state.dead_letters).await;

        info!(mutation.id = %id, "Dead letter requeued");
        Ok(letter.mutation)
    }

    /// Drop a dead letter for good
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no dead letter has this id
    pub async fn discard_dead_letter(&self, id: &MutationId) -> AppResult<DeadLetter> {
        let mut state = self.state.lock().await;
        let index = state
            .dead_letters
            .iter()
            .position(|letter| &letter.mutation.id == id)
            .ok_or_else(|| AppError::not_found(format!("no dead letter with id {id}")))?;

        let letter = state.dead_letters.remove(index);
        self.persist_dead_letters(&state.dead_letters).await;

        info!(mutation.id = %id, "Dead letter discarded");
        Ok(letter)
    }

    /// Whether a sync pass is in flight
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Whether the last persist of every stored list succeeded, i.e. storage matches memory
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.pending_durable.load(Ordering::Acquire)
            && self.dead_letters_durable.load(Ordering::Acquire)
    }

    /// Wait until no sync pass is in flight
    pub async fn wait_idle(&self) {
        let notified = self.idle.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a pass ending in between still wakes us
        notified.as_mut().enable();
        if self.is_syncing() {
            notified.await;
        }
    }

    /// Active failure policy
    #[must_use]
    pub const fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy
    }

    /// Receive queue events from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Publish an event to subscribers; dropped when nobody listens
    pub(crate) fn publish(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }

    /// Send a mutation straight to the backend, bypassing the queue
    ///
    /// Uses the same dispatch and attempt bound as a replay.
    pub(crate) async fn send_direct(&self, mutation: &Mutation) -> Result<(), RemoteError> {
        replay::dispatch_bounded(self.remote.as_ref(), mutation, self.config.attempt_timeout)
            .await?;
        self.invalidate_queries(mutation.kind()).await;
        Ok(())
    }

    async fn invalidate_queries(&self, kind: MutationKind) {
        let Some(cache) = &self.cache else {
            return;
        };
        for prefix in kind.affected_queries() {
            cache.invalidate_prefix(prefix).await;
        }
    }

    async fn persist_pending(&self, pending: &[QueuedMutation]) {
        match write_json(self.store.as_ref(), storage_keys::MUTATION_QUEUE, &pending).await {
            Ok(()) => self.pending_durable.store(true, Ordering::Release),
            Err(e) => {
                error!(
                    error = %e,
                    pending = pending.len(),
                    "Failed to persist mutation queue, in-memory queue is ahead of storage"
                );
                self.pending_durable.store(false, Ordering::Release);
            }
        }
    }

    /// Returns whether the list reached storage
    async fn persist_dead_letters(&self, dead_letters: &[DeadLetter]) -> bool {
        match write_json(self.store.as_ref(), storage_keys::DEAD_LETTERS, &dead_letters).await {
            Ok(()) => {
                self.dead_letters_durable.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to persist dead letters");
                self.dead_letters_durable.store(false, Ordering::Release);
                false
            }
        }
    }
}

async fn load_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> AppResult<Vec<T>> {
    match read_json::<Vec<T>>(store, key).await? {
        JsonRead::Missing => Ok(Vec::new()),
        JsonRead::Value(items) => Ok(items),
        JsonRead::Corrupt { raw, error } => {
            let backup_key = format!("{key}{}", storage_keys::CORRUPT_SUFFIX);
            error!(key, backup_key = %backup_key, error = %error, "Stored list is unreadable, starting empty");
            if let Err(e) = store.set_item(&backup_key, &raw).await {
                warn!(key, error = %e, "Failed to back up unreadable value");
            }
            Ok(Vec::new())
        }
    }
}
