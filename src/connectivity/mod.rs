// ABOUTME: Connectivity state and online/offline transition stream
// ABOUTME: Current state via watch, every change via broadcast so fast toggles are not coalesced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! # Connectivity Monitor
//!
//! The platform layer (or [`probe::ReachabilityProbe`]) reports connectivity
//! with [`ConnectivityMonitor::set_online`]. Consumers read the current state
//! for banners and subscribe to transitions to trigger a sync pass.

/// Periodic backend reachability probe
pub mod probe;

pub use probe::ReachabilityProbe;

use crate::constants::defaults;
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::info;

/// Last known connectivity plus a stream of changes
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
    transitions: broadcast::Sender<bool>,
    // Keeps state updates and transition broadcasts in the same order
    publish_lock: Mutex<()>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor {
    /// Create a monitor with a known initial state
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        let (transitions, _) = broadcast::channel(defaults::CONNECTIVITY_CHANNEL_CAPACITY);
        Self {
            state,
            transitions,
            publish_lock: Mutex::new(()),
        }
    }

    /// Last reported state
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Report the current state; returns whether it changed
    ///
    /// Repeating the current state publishes nothing.
    pub fn set_online(&self, online: bool) -> bool {
        let _ordered = self
            .publish_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
            let _ = self.transitions.send(online);
        }
        changed
    }

    /// Receive every future transition, in order
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.transitions.subscribe()
    }

    /// Current state together with a receiver for every later transition
    ///
    /// Both are taken under the publish lock, so a transition is either
    /// reflected in the returned state or delivered to the receiver, never both.
    #[must_use]
    pub fn snapshot_and_subscribe(&self) -> (bool, broadcast::Receiver<bool>) {
        let _ordered = self
            .publish_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (*self.state.borrow(), self.transitions.subscribe())
    }

    /// Watch the current state (intermediate values may be skipped)
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
