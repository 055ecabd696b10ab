// ABOUTME: Shared HTTP client with connection pooling for backend calls
// ABOUTME: Lazily built once with configurable request and connect timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use crate::constants::defaults::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_TIMEOUT_SECS};
use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Configured timeout values for the shared client
static CLIENT_TIMEOUTS: OnceLock<(u64, u64)> = OnceLock::new();

/// Global shared HTTP client with configured timeouts
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Set the shared client's timeouts
///
/// Only the first call has an effect, and only if it happens before the first
/// [`shared_client`] call. Otherwise the defaults (30s request, 10s connect)
/// apply.
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) {
    let _ = CLIENT_TIMEOUTS.set((timeout_secs, connect_timeout_secs));
}

/// Get the shared HTTP client
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let (timeout, connect_timeout) = CLIENT_TIMEOUTS
            .get()
            .copied()
            .unwrap_or((HTTP_TIMEOUT_SECS, HTTP_CONNECT_TIMEOUT_SECS));
        build_client(timeout, connect_timeout)
    })
}

/// Build a dedicated client with its own timeouts
#[must_use]
pub fn build_client(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
