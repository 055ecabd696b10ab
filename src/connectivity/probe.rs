// ABOUTME: Background task that probes the backend and feeds the connectivity monitor
// ABOUTME: Any HTTP answer counts as reachable, a transport failure as offline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use super::ConnectivityMonitor;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Shortest accepted probe period
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic reachability check against the backend base URL
#[derive(Clone)]
pub struct ReachabilityProbe {
    client: Client,
    url: String,
    interval: Duration,
}

impl ReachabilityProbe {
    /// Probe `url` every `interval` using `client`
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            interval,
        }
    }

    /// Run one probe
    pub async fn check_once(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = response.status().as_u16(), "Backend reachable");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Backend unreachable");
                false
            }
        }
    }

    /// Probe forever, reporting each result to `monitor`
    ///
    /// Abort the returned handle to stop probing.
    #[must_use]
    pub fn spawn(self, monitor: Arc<ConnectivityMonitor>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reachable = self.check_once().await;
                monitor.set_online(reachable);
            }
        })
    }
}
