// ABOUTME: Integration tests for failure classification and the dead-letter policy
// ABOUTME: Terminal rejections retry by default and are set aside only when opted in
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors
#![allow(missing_docs, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{memory_queue, persisted_json, plan, session, ScriptedRemote};
use std::sync::Arc;
use trainsync::constants::storage_keys;
use trainsync::errors::{ErrorCode, RemoteError};
use trainsync::models::{MutationId, MutationKind};
use trainsync::queue::{FailurePolicy, MutationQueue, QueueConfig, QueueEvent};

fn dead_letter_config() -> QueueConfig {
    QueueConfig {
        failure_policy: FailurePolicy::DeadLetterTerminal,
        ..QueueConfig::default()
    }
}

#[tokio::test]
async fn test_rejected_mutation_is_retried_forever_by_default() {
    let remote = ScriptedRemote::failing(RemoteError::status(422, "invalid category"));
    let (queue, _store) = memory_queue(Arc::clone(&remote), QueueConfig::default()).await;
    let record = queue.enqueue(session(9)).await;

    for _ in 0..3 {
        let report = queue.sync_queue().await.report().unwrap();
        assert_eq!(report.synced, 0);
        assert_eq!(report.dead_lettered, 0);
    }

    assert_eq!(remote.call_count(), 3);
    assert_eq!(queue.pending().await, vec![record]);
    assert!(queue.dead_letters().await.is_empty());
}

#[tokio::test]
async fn test_terminal_rejection_moves_to_dead_letters_when_opted_in() {
    let remote = ScriptedRemote::scripted(vec![
        Err(RemoteError::status(400, "order must not be empty")),
        Ok(()),
    ]);
    let (queue, store) = memory_queue(Arc::clone(&remote), dead_letter_config()).await;
    let mut events = queue.subscribe();

    let rejected = queue.enqueue(plan("Broken")).await;
    let accepted = queue.enqueue(plan("Fine")).await;
    // Drain the two Queued events
    events.recv().await.unwrap();
    events.recv().await.unwrap();

    let report = queue.sync_queue().await.report().unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.dead_lettered, 1);
    assert_eq!(report.pending, 0);
    assert!(queue.is_empty().await);

    let letters = queue.dead_letters().await;
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].mutation, rejected);
    assert_eq!(letters[0].status, Some(400));
    assert_ne!(letters[0].mutation.id, accepted.id);

    let persisted = persisted_json(&store, storage_keys::DEAD_LETTERS).await;
    assert_eq!(persisted[0]["mutation"]["id"], rejected.id.as_str());

    match events.recv().await.unwrap() {
        QueueEvent::DeadLettered { id, kind, reason } => {
            assert_eq!(id, rejected.id);
            assert_eq!(kind, MutationKind::CreateTrainingPlan);
            assert!(reason.contains("400"));
        }
        other => panic!("expected DeadLettered, got {other:?}"),
    }
    assert!(matches!(
        events.recv().await.unwrap(),
        QueueEvent::SyncCompleted(_)
    ));
}

#[tokio::test]
async fn test_transient_failures_are_never_dead_lettered() {
    let remote = ScriptedRemote::scripted(vec![
        Err(RemoteError::status(401, "token expired")),
        Err(RemoteError::status(503, "")),
        Err(RemoteError::network("dns failure")),
    ]);
    let (queue, _store) = memory_queue(remote, dead_letter_config()).await;
    for name in ["A", "B", "C"] {
        queue.enqueue(plan(name)).await;
    }

    let report = queue.sync_queue().await.report().unwrap();
    assert_eq!(report.dead_lettered, 0);
    assert_eq!(report.pending, 3);
    assert!(queue.dead_letters().await.is_empty());
}

#[tokio::test]
async fn test_requeued_dead_letter_goes_to_the_tail() {
    let remote = ScriptedRemote::scripted(vec![Err(RemoteError::status(409, "duplicate"))]);
    let (queue, store) = memory_queue(Arc::clone(&remote), dead_letter_config()).await;

    let rejected = queue.enqueue(plan("Dup")).await;
    queue.sync_queue().await;
    let later = queue.enqueue(plan("Later")).await;

    let requeued = queue.requeue_dead_letter(&rejected.id).await.unwrap();
    assert_eq!(requeued, rejected);
    assert!(queue.dead_letters().await.is_empty());
    assert_eq!(queue.pending().await, vec![later, rejected]);
    assert_eq!(
        persisted_json(&store, storage_keys::DEAD_LETTERS).await,
        serde_json::json!([])
    );

    let report = queue.sync_queue().await.report().unwrap();
    assert_eq!(report.synced, 2);
}

#[tokio::test]
async fn test_discarded_dead_letter_is_gone() {
    let remote = ScriptedRemote::failing(RemoteError::status(422, "bad"));
    let (queue, _store) = memory_queue(remote, dead_letter_config()).await;

    let rejected = queue.enqueue(session(2)).await;
    queue.sync_queue().await;

    let letter = queue.discard_dead_letter(&rejected.id).await.unwrap();
    assert_eq!(letter.mutation.id, rejected.id);
    assert!(queue.dead_letters().await.is_empty());
    assert!(queue.is_empty().await);

    let err = queue.discard_dead_letter(&rejected.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_unknown_dead_letter_id_is_not_found() {
    let (queue, _store) = memory_queue(ScriptedRemote::accepting(), dead_letter_config()).await;
    let err = queue
        .requeue_dead_letter(&MutationId::from("0-00000000"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_rejection_stays_queued_while_dead_letters_cannot_be_stored() {
    let remote = ScriptedRemote::failing(RemoteError::status(400, "unknown plan"));
    let (queue, store) = memory_queue(Arc::clone(&remote), dead_letter_config()).await;
    let record = queue.enqueue(session(4)).await;
    store.set_fail_key(storage_keys::DEAD_LETTERS, true);

    let report = queue.sync_queue().await.report().unwrap();
    assert_eq!(report.dead_lettered, 0);
    assert_eq!(report.pending, 1);
    assert_eq!(report.retained(), 1);
    assert!(!queue.is_durable());
    assert_eq!(queue.pending().await, vec![record.clone()]);
    assert!(queue.dead_letters().await.is_empty());

    // A restart still finds the write
    let reloaded = MutationQueue::load(Arc::new(store.clone()), remote, dead_letter_config())
        .await
        .unwrap();
    assert_eq!(reloaded.pending().await, vec![record.clone()]);

    store.set_fail_key(storage_keys::DEAD_LETTERS, false);
    let report = queue.sync_queue().await.report().unwrap();
    assert_eq!(report.dead_lettered, 1);
    assert!(queue.is_empty().await);
    assert!(queue.is_durable());
    assert_eq!(
        persisted_json(&store, storage_keys::DEAD_LETTERS).await[0]["mutation"]["id"],
        record.id.as_str()
    );
}
