// ABOUTME: Data models for queued writes and their kind-specific payloads
// ABOUTME: Re-exports mutation records, exercise and training payload types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! Core data models
//!
//! A [`QueuedMutation`] wraps one [`Mutation`]: a tagged variant with exactly
//! one payload shape per kind. Adding a kind means adding a variant, and every
//! exhaustive `match` over [`Mutation`] then points at the code that must learn
//! about it.

/// New exercise payload
mod exercise;
/// Queued mutation record, identifiers and kinds
mod mutation;
/// Training plan and training session payloads
mod training;

pub use exercise::NewExercise;
pub use mutation::{Mutation, MutationId, MutationKind, QueuedMutation};
pub use training::{NewTrainingPlan, SetRecord, TrainingSessionRecord};

/// Backend identifier of an exercise
pub type ExerciseId = u64;
/// Backend identifier of a category
pub type CategoryId = u64;
/// Backend identifier of a training plan
pub type PlanId = u64;
