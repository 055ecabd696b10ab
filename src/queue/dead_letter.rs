// ABOUTME: Failure policy and dead-letter records for permanently rejected mutations
// ABOUTME: Dead lettering is opt-in; the default policy keeps retrying every failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use crate::errors::{FailureClass, RemoteError};
use crate::models::QueuedMutation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a sync pass does with a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep every failed mutation queued and retry it on the next pass
    #[default]
    RetryAll,
    /// Move terminally rejected mutations to the dead-letter list
    DeadLetterTerminal,
}

impl FailurePolicy {
    /// Parse from configuration text, falling back to [`FailurePolicy::RetryAll`]
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "dead_letter" | "dead-letter" | "dead_letter_terminal" => Self::DeadLetterTerminal,
            _ => Self::RetryAll,
        }
    }

    /// Whether a failure of `class` leaves the retry path under this policy
    #[must_use]
    pub const fn dead_letters(self, class: FailureClass) -> bool {
        matches!(
            (self, class),
            (Self::DeadLetterTerminal, FailureClass::Terminal)
        )
    }
}

/// A mutation set aside as undeliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    /// The original record, unchanged
    pub mutation: QueuedMutation,
    /// Why the backend (or the client) rejected it
    pub reason: String,
    /// HTTP status when the backend answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// When it was set aside
    pub failed_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Record `mutation` as rejected with `error`
    #[must_use]
    pub fn new(mutation: QueuedMutation, error: &RemoteError) -> Self {
        Self {
            mutation,
            reason: error.to_string(),
            status: error.http_status(),
            failed_at: Utc::now(),
        }
    }
}
