// ABOUTME: Remote write API seam between the queue and the fitness backend
// ABOUTME: One async operation per mutation kind, each reporting success or a RemoteError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Remote Write API
//!
//! [`RemoteWriteApi`] is what the queue replays against. [`HttpWriteApi`] is the
//! production implementation talking to the REST backend; tests substitute
//! scripted doubles.

/// reqwest implementation of the write API
pub mod client;
/// Shared HTTP client with configured timeouts
pub mod http_client;

pub use client::{HttpWriteApi, StaticToken, TokenProvider};

use crate::errors::RemoteError;
use crate::models::{NewExercise, NewTrainingPlan, TrainingSessionRecord};

/// Backend write operations, one per mutation kind
///
/// The backend does not promise idempotency, so an implementation must not
/// retry internally: the queue decides when a mutation is sent again.
#[async_trait::async_trait]
pub trait RemoteWriteApi: Send + Sync {
    /// Create an exercise (multipart form, optional image)
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] when the request fails or is rejected
    async fn create_exercise(&self, exercise: &NewExercise) -> Result<(), RemoteError>;

    /// Create a training plan
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] when the request fails or is rejected
    async fn create_training_plan(&self, plan: &NewTrainingPlan) -> Result<(), RemoteError>;

    /// Save a completed training session
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] when the request fails or is rejected
    async fn save_training_session(
        &self,
        session: &TrainingSessionRecord,
    ) -> Result<(), RemoteError>;
}
