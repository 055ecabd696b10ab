// ABOUTME: Events published by the mutation queue for UI acknowledgments and banners
// ABOUTME: Includes the end-of-pass sync report and ready-to-display notice texts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use crate::constants::notices;
use crate::models::{MutationId, MutationKind};
use serde::Serialize;

/// Summary of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Mutations in the pass snapshot
    pub attempted: usize,
    /// Mutations confirmed by the backend and removed from the queue
    pub synced: usize,
    /// Mutations moved to the dead-letter list
    pub dead_lettered: usize,
    /// Queue length after the pass, including mutations enqueued during it
    pub pending: usize,
}

impl SyncReport {
    /// Mutations from the snapshot that stay queued for the next pass
    #[must_use]
    pub const fn retained(&self) -> usize {
        self.attempted - self.synced - self.dead_lettered
    }
}

/// Result of asking for a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another pass was in flight; nothing was done
    AlreadyRunning,
    /// The pass ran to completion
    Completed(SyncReport),
}

impl SyncOutcome {
    /// Report of a completed pass
    #[must_use]
    pub const fn report(&self) -> Option<SyncReport> {
        match self {
            Self::AlreadyRunning => None,
            Self::Completed(report) => Some(*report),
        }
    }
}

/// Something the UI may want to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// A write was stored locally for later delivery
    Queued {
        /// Identifier of the queued mutation
        id: MutationId,
        /// Kind of the queued mutation
        kind: MutationKind,
    },
    /// A sync pass that attempted at least one mutation finished
    SyncCompleted(SyncReport),
    /// A mutation was rejected as undeliverable and set aside
    DeadLettered {
        /// Identifier of the mutation
        id: MutationId,
        /// Kind of the mutation
        kind: MutationKind,
        /// Backend or local reason
        reason: String,
    },
    /// Connectivity flipped
    ConnectivityChanged {
        /// New state
        online: bool,
    },
}

impl QueueEvent {
    /// One-line text for a toast or banner, if the event warrants one
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Queued { .. } => Some(notices::QUEUED.to_owned()),
            Self::SyncCompleted(report) if report.synced > 0 => {
                let mut text = format!("{} actions synchronized.", report.synced);
                if report.pending > 0 {
                    text.push_str(&format!(" {} still pending.", report.pending));
                }
                Some(text)
            }
            Self::SyncCompleted(_) => None,
            Self::DeadLettered { kind, reason, .. } => Some(format!(
                "{kind} could not be delivered and was set aside: {reason}"
            )),
            Self::ConnectivityChanged { online: false } => {
                Some(notices::OFFLINE_BANNER.to_owned())
            }
            Self::ConnectivityChanged { online: true } => Some(notices::ONLINE.to_owned()),
        }
    }
}
