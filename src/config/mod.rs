// ABOUTME: Configuration module for queue, storage, backend and connectivity settings
// ABOUTME: All values come from environment variables with documented defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! Configuration module
//!
//! - **Environment**: [`SyncConfig`] loaded from environment variables

/// Environment-based configuration
pub mod environment;

pub use environment::{ApiConfig, ConnectivityConfig, StorageBackend, StorageConfig, SyncConfig};
