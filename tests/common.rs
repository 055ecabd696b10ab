// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted remote write API double, payload builders and queue setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::significant_drop_tightening
)]
//! Shared test utilities for `trainsync`

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Semaphore;
use trainsync::errors::RemoteError;
use trainsync::models::{
    Mutation, NewExercise, NewTrainingPlan, SetRecord, TrainingSessionRecord,
};
use trainsync::queue::{MutationQueue, QueueConfig};
use trainsync::remote::RemoteWriteApi;
use trainsync::storage::memory::InMemoryStore;
use trainsync::storage::KeyValueStore;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Remote double that records every call and answers from a script
///
/// Scripted results are consumed in call order; once the script is empty the
/// default result answers. With a gate installed, each call is recorded first
/// and then blocks until the test releases it.
pub struct ScriptedRemote {
    calls: Mutex<Vec<Mutation>>,
    script: Mutex<VecDeque<Result<(), RemoteError>>>,
    default: Mutex<Result<(), RemoteError>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRemote {
    /// Every call succeeds
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::with_default(Ok(())))
    }

    /// Every call fails with `error`
    pub fn failing(error: RemoteError) -> Arc<Self> {
        Arc::new(Self::with_default(Err(error)))
    }

    /// Calls answer from `script`, then succeed
    pub fn scripted(script: Vec<Result<(), RemoteError>>) -> Arc<Self> {
        let remote = Self::with_default(Ok(()));
        *remote.script.lock().unwrap() = script.into();
        Arc::new(remote)
    }

    /// Every call succeeds, but only once released through the returned gate
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut remote = Self::with_default(Ok(()));
        remote.gate = Some(Arc::clone(&gate));
        (Arc::new(remote), gate)
    }

    fn with_default(default: Result<(), RemoteError>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(default),
            gate: None,
        }
    }

    /// Change the answer used once the script is exhausted
    pub fn set_default(&self, result: Result<(), RemoteError>) {
        *self.default.lock().unwrap() = result;
    }

    /// Mutations received so far, in call order
    pub fn calls(&self) -> Vec<Mutation> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Wait until at least `n` calls were received
    pub async fn wait_for_calls(&self, n: usize) {
        eventually(move || async move { self.call_count() >= n }).await;
    }

    async fn answer(&self, mutation: Mutation) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(mutation);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.default.lock().unwrap().clone())
    }
}

#[async_trait::async_trait]
impl RemoteWriteApi for ScriptedRemote {
    async fn create_exercise(&self, exercise: &NewExercise) -> Result<(), RemoteError> {
        self.answer(exercise.clone().into()).await
    }

    async fn create_training_plan(&self, plan: &NewTrainingPlan) -> Result<(), RemoteError> {
        self.answer(plan.clone().into()).await
    }

    async fn save_training_session(
        &self,
        session: &TrainingSessionRecord,
    ) -> Result<(), RemoteError> {
        self.answer(session.clone().into()).await
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 2s");
}

/// Plan payload with a recognizable name
pub fn plan(name: &str) -> NewTrainingPlan {
    NewTrainingPlan {
        name: name.to_owned(),
        description: None,
        category: 1,
        public: false,
        break_time: 60,
        order: vec![3, 1, 2],
    }
}

/// Session payload for `plan_id`
pub fn session(plan_id: u64) -> TrainingSessionRecord {
    TrainingSessionRecord {
        plan_id,
        exercises_order: vec![3, 1],
        sets: vec![
            SetRecord {
                exercise_id: 3,
                weight: 60.0,
                reps: 8,
                duration: 0,
            },
            SetRecord {
                exercise_id: 1,
                weight: 22.5,
                reps: 12,
                duration: 0,
            },
        ],
    }
}

/// Exercise payload without an image
pub fn exercise(name: &str) -> NewExercise {
    NewExercise {
        name: name.to_owned(),
        description: "test exercise".to_owned(),
        category: 2,
        public: false,
        image_path: None,
    }
}

/// Name of a plan or exercise mutation, plan id of a session
pub fn label(mutation: &Mutation) -> String {
    match mutation {
        Mutation::CreateExercise(exercise) => exercise.name.clone(),
        Mutation::CreateTrainingPlan(plan) => plan.name.clone(),
        Mutation::SaveTrainingSession(session) => format!("session:{}", session.plan_id),
    }
}

/// Queue over a fresh in-memory store
pub async fn memory_queue(
    remote: Arc<ScriptedRemote>,
    config: QueueConfig,
) -> (Arc<MutationQueue>, InMemoryStore) {
    init_test_logging();
    let store = InMemoryStore::new();
    let queue = MutationQueue::load(Arc::new(store.clone()), remote, config)
        .await
        .unwrap();
    (Arc::new(queue), store)
}

/// Persisted queue as raw JSON, `null` when absent
pub async fn persisted_json(store: &dyn KeyValueStore, key: &str) -> serde_json::Value {
    store
        .get_item(key)
        .await
        .unwrap()
        .map_or(serde_json::Value::Null, |raw| {
            serde_json::from_str(&raw).unwrap()
        })
}
