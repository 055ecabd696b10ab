// ABOUTME: Main library entry point for the trainsync offline write engine
// ABOUTME: Queues fitness writes while offline and replays them when connectivity returns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

#![deny(unsafe_code)]

//! # trainsync
//!
//! Offline-first write path for a fitness client. Writes made without
//! connectivity (new exercises, training plans, completed sessions) are
//! stored in a durable FIFO queue and replayed against the backend, in order,
//! once the device is back online.
//!
//! ## Architecture
//!
//! - **Queue**: [`queue::MutationQueue`], the durable ordered list of pending writes
//! - **Remote**: [`remote::RemoteWriteApi`] and its HTTP implementation
//! - **Storage**: [`storage::KeyValueStore`] backends (memory, JSON files, `SQLite`)
//! - **Connectivity**: transition stream and optional reachability probe
//! - **Service**: [`sync_service::OfflineSync`] wires the pieces together
//! - **Cache**: [`cache::QueryCache`] keeps read results for offline screens
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trainsync::config::SyncConfig;
//! use trainsync::models::NewTrainingPlan;
//! use trainsync::sync_service::{OfflineSync, Submission};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig::from_env()?;
//!     let sync = OfflineSync::from_config(&config).await?;
//!     sync.start();
//!
//!     let plan = NewTrainingPlan {
//!         name: "Push day".into(),
//!         description: None,
//!         category: 2,
//!         public: false,
//!         break_time: 90,
//!         order: vec![4, 9, 12],
//!     };
//!     match sync.submit(plan).await? {
//!         Submission::Sent => println!("saved"),
//!         Submission::Queued(record) => println!("queued as {}", record.id),
//!     }
//!     Ok(())
//! }
//! ```

/// Read cache for query results
pub mod cache;

/// Configuration loaded from the environment
pub mod config;

/// Connectivity state and reachability probing
pub mod connectivity;

/// Constants shared with trainsync-core
pub mod constants;

/// Unified error types
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Mutation and payload models
pub mod models;

/// Durable offline mutation queue
pub mod queue;

/// Remote write API and HTTP client
pub mod remote;

/// Durable key-value storage backends
pub mod storage;

/// Composition root tying queue, connectivity and remote together
pub mod sync_service;
