// ABOUTME: Dispatches a queued mutation to the matching remote write operation
// ABOUTME: Bounds each attempt with an optional timeout reported as a transient failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use crate::errors::RemoteError;
use crate::models::Mutation;
use crate::remote::RemoteWriteApi;
use std::time::Duration;

/// Send `mutation` to the backend operation of its kind
pub(crate) async fn dispatch(
    remote: &dyn RemoteWriteApi,
    mutation: &Mutation,
) -> Result<(), RemoteError> {
    match mutation {
        Mutation::CreateExercise(exercise) => remote.create_exercise(exercise).await,
        Mutation::CreateTrainingPlan(plan) => remote.create_training_plan(plan).await,
        Mutation::SaveTrainingSession(session) => remote.save_training_session(session).await,
    }
}

/// Dispatch with an upper bound on the attempt duration
pub(crate) async fn dispatch_bounded(
    remote: &dyn RemoteWriteApi,
    mutation: &Mutation,
    limit: Option<Duration>,
) -> Result<(), RemoteError> {
    let Some(limit) = limit else {
        return dispatch(remote, mutation).await;
    };
    tokio::time::timeout(limit, dispatch(remote, mutation))
        .await
        .unwrap_or_else(|_| {
            Err(RemoteError::Timeout {
                after_ms: limit.as_millis() as u64,
            })
        })
}
