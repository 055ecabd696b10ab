// ABOUTME: Environment configuration management for the sync engine
// ABOUTME: Parses backend URL, token, storage backend, timeouts and failure policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! Environment-based configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `TRAINSYNC_API_URL` | `http://127.0.0.1:8000` |
//! | `TRAINSYNC_ACCESS_TOKEN` | unset |
//! | `TRAINSYNC_STORAGE` | `file` (`memory`, `file`, `sqlite`) |
//! | `TRAINSYNC_DATA_DIR` | platform local data dir + `/trainsync` |
//! | `TRAINSYNC_ATTEMPT_TIMEOUT_SECS` | `30` (`0` = unbounded) |
//! | `TRAINSYNC_FAILURE_POLICY` | `retry_all` (`dead_letter`) |
//! | `TRAINSYNC_PROBE_INTERVAL_SECS` | `15` (`0` = no probe) |
//! | `TRAINSYNC_HTTP_TIMEOUT_SECS` | `30` |
//! | `TRAINSYNC_HTTP_CONNECT_TIMEOUT_SECS` | `10` |

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use crate::queue::{FailurePolicy, QueueConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Durable storage backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Nothing survives the process
    Memory,
    /// One JSON file per key
    #[default]
    File,
    /// `SQLite` key-value table
    Sqlite,
}

impl StorageBackend {
    /// Parse from configuration text, falling back to [`StorageBackend::File`]
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::File,
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Where queue state is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend kind
    pub backend: StorageBackend,
    /// Directory for file and `SQLite` backends
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    pub base_url: String,
    /// Bearer token attached to writes
    pub access_token: Option<String>,
    /// Whole-request timeout
    pub timeout_secs: u64,
    /// Connect timeout
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_BASE_URL.to_owned(),
            access_token: None,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            connect_timeout_secs: defaults::HTTP_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Connectivity detection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityConfig {
    /// Interval of the reachability probe; `None` disables it
    pub probe_interval: Option<Duration>,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval: Some(Duration::from_secs(defaults::PROBE_INTERVAL_SECS)),
        }
    }
}

/// Complete sync engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncConfig {
    /// Backend connection
    pub api: ApiConfig,
    /// Persistence
    pub storage: StorageConfig,
    /// Queue behaviour
    pub queue: QueueConfig,
    /// Connectivity detection
    pub connectivity: ConnectivityConfig,
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a numeric variable does not parse
    pub fn from_env() -> AppResult<Self> {
        info!("Loading sync configuration from environment variables");

        let config = Self {
            api: ApiConfig {
                base_url: env_var_or("TRAINSYNC_API_URL", defaults::API_BASE_URL),
                access_token: env::var("TRAINSYNC_ACCESS_TOKEN")
                    .ok()
                    .filter(|token| !token.trim().is_empty()),
                timeout_secs: env_parse("TRAINSYNC_HTTP_TIMEOUT_SECS", defaults::HTTP_TIMEOUT_SECS)?,
                connect_timeout_secs: env_parse(
                    "TRAINSYNC_HTTP_CONNECT_TIMEOUT_SECS",
                    defaults::HTTP_CONNECT_TIMEOUT_SECS,
                )?,
            },
            storage: StorageConfig {
                backend: StorageBackend::from_str_or_default(&env_var_or("TRAINSYNC_STORAGE", "file")),
                data_dir: env::var("TRAINSYNC_DATA_DIR")
                    .map_or_else(|_| default_data_dir(), PathBuf::from),
            },
            queue: QueueConfig {
                attempt_timeout: seconds_or_disabled(env_parse(
                    "TRAINSYNC_ATTEMPT_TIMEOUT_SECS",
                    defaults::ATTEMPT_TIMEOUT_SECS,
                )?),
                failure_policy: FailurePolicy::from_str_or_default(&env_var_or(
                    "TRAINSYNC_FAILURE_POLICY",
                    "retry_all",
                )),
            },
            connectivity: ConnectivityConfig {
                probe_interval: seconds_or_disabled(env_parse(
                    "TRAINSYNC_PROBE_INTERVAL_SECS",
                    defaults::PROBE_INTERVAL_SECS,
                )?),
            },
        };

        info!(
            api.base_url = %config.api.base_url,
            api.authenticated = config.api.access_token.is_some(),
            storage.backend = %config.storage.backend,
            storage.data_dir = %config.storage.data_dir.display(),
            queue.failure_policy = ?config.queue.failure_policy,
            "Sync configuration loaded"
        );
        Ok(config)
    }
}

/// Platform data directory for persisted state
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(defaults::DATA_DIR_NAME)
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, using `default` when unset
fn env_parse<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Zero disables a periodic or bounded behaviour
fn seconds_or_disabled(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
