// ABOUTME: Queued mutation record with generated identifier and enqueue timestamp
// ABOUTME: Mutation is a tagged variant holding exactly one payload shape per kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::{NewExercise, NewTrainingPlan, TrainingSessionRecord};
use crate::constants::query_keys;
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a pending write, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    /// Multipart exercise creation
    CreateExercise,
    /// JSON training plan creation
    CreateTrainingPlan,
    /// JSON training session save
    SaveTrainingSession,
}

impl MutationKind {
    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateExercise => "CREATE_EXERCISE",
            Self::CreateTrainingPlan => "CREATE_TRAINING_PLAN",
            Self::SaveTrainingSession => "SAVE_TRAINING_SESSION",
        }
    }

    /// Query key prefixes whose cached results are outdated once this write lands
    #[must_use]
    pub const fn affected_queries(self) -> &'static [&'static str] {
        match self {
            Self::CreateExercise => &[query_keys::EXERCISES],
            Self::CreateTrainingPlan => &[query_keys::TRAININGS],
            Self::SaveTrainingSession => &[query_keys::TRAININGS, query_keys::USERS],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write operation and its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutation {
    /// Create an exercise
    CreateExercise(NewExercise),
    /// Create a training plan
    CreateTrainingPlan(NewTrainingPlan),
    /// Save a completed training session
    SaveTrainingSession(TrainingSessionRecord),
}

impl Mutation {
    /// Kind of this mutation
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::CreateExercise(_) => MutationKind::CreateExercise,
            Self::CreateTrainingPlan(_) => MutationKind::CreateTrainingPlan,
            Self::SaveTrainingSession(_) => MutationKind::SaveTrainingSession,
        }
    }

    /// Check the payload the way the entry forms do before submitting
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a required field is empty
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::CreateExercise(exercise) => exercise.validate(),
            Self::CreateTrainingPlan(plan) => plan.validate(),
            Self::SaveTrainingSession(session) => session.validate(),
        }
    }
}

impl From<NewExercise> for Mutation {
    fn from(payload: NewExercise) -> Self {
        Self::CreateExercise(payload)
    }
}

impl From<NewTrainingPlan> for Mutation {
    fn from(payload: NewTrainingPlan) -> Self {
        Self::CreateTrainingPlan(payload)
    }
}

impl From<TrainingSessionRecord> for Mutation {
    fn from(payload: TrainingSessionRecord) -> Self {
        Self::SaveTrainingSession(payload)
    }
}

/// Identifier of a queued mutation: enqueue time in milliseconds plus a random suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(String);

impl MutationId {
    /// Generate an identifier for a mutation enqueued at `at`
    ///
    /// Unique enough for a single-device queue; not a cryptographic identifier.
    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix: u32 = rand::random();
        Self(format!("{}-{suffix:08x}", at.timestamp_millis()))
    }

    /// Borrow the identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MutationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MutationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending write as it is held in memory and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    /// Unique identifier generated at enqueue time
    pub id: MutationId,
    /// The write and its payload
    pub mutation: Mutation,
    /// When the write was queued; informational, ordering is positional
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedMutation {
    /// Wrap a mutation with a fresh identifier and the current time
    #[must_use]
    pub fn new(mutation: Mutation) -> Self {
        let enqueued_at = Utc::now();
        Self {
            id: MutationId::generate(enqueued_at),
            mutation,
            enqueued_at,
        }
    }

    /// Kind of the wrapped mutation
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        self.mutation.kind()
    }
}
