// ABOUTME: Payloads for training plan creation and completed training sessions
// ABOUTME: Exercise order is positional and preserved exactly as entered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::{CategoryId, ExerciseId, PlanId};
use crate::constants::defaults::BREAK_TIME_SECS;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const fn default_break_time() -> u32 {
    BREAK_TIME_SECS
}

/// A new training plan as assembled in the plan editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrainingPlan {
    /// Plan name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category identifier
    pub category: CategoryId,
    /// Whether other users can see the plan
    #[serde(default)]
    pub public: bool,
    /// Rest between exercises, in seconds
    #[serde(default = "default_break_time")]
    pub break_time: u32,
    /// Exercises in execution order
    pub order: Vec<ExerciseId>,
}

impl NewTrainingPlan {
    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_input("plan name must not be empty"));
        }
        if self.order.is_empty() {
            return Err(AppError::invalid_input(
                "a plan needs at least one exercise",
            ));
        }
        Ok(())
    }
}

/// One completed set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Exercise the set belongs to
    pub exercise_id: ExerciseId,
    /// Load used
    pub weight: f64,
    /// Repetitions performed
    pub reps: u32,
    /// Time under load in seconds (0 when not tracked)
    #[serde(default)]
    pub duration: u32,
}

/// A finished workout of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSessionRecord {
    /// Plan that was executed
    pub plan_id: PlanId,
    /// Exercises in the order they were performed
    pub exercises_order: Vec<ExerciseId>,
    /// Completed sets
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

impl TrainingSessionRecord {
    pub(crate) fn validate(&self) -> AppResult<()> {
        if let Some(set) = self
            .sets
            .iter()
            .find(|set| !self.exercises_order.contains(&set.exercise_id))
        {
            return Err(AppError::invalid_input(format!(
                "set references exercise {} which is not part of the session",
                set.exercise_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_time_defaults_when_missing() {
        let plan: NewTrainingPlan =
            serde_json::from_str(r#"{"name":"Full body A","category":1,"order":[4,2]}"#).unwrap();
        assert_eq!(plan.break_time, 60);
        assert!(!plan.public);
        assert_eq!(plan.order, vec![4, 2]);
    }

    #[test]
    fn test_plan_without_exercises_is_rejected() {
        let plan = NewTrainingPlan {
            name: "Empty".to_owned(),
            description: None,
            category: 1,
            public: false,
            break_time: 60,
            order: Vec::new(),
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_session_set_must_reference_ordered_exercise() {
        let session = TrainingSessionRecord {
            plan_id: 1,
            exercises_order: vec![1],
            sets: vec![SetRecord {
                exercise_id: 9,
                weight: 20.0,
                reps: 10,
                duration: 0,
            }],
        };
        assert!(session.validate().is_err());
    }
}
