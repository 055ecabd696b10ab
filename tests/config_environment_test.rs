// ABOUTME: Tests for environment-based sync configuration parsing
// ABOUTME: Runs serially because every test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors
#![allow(missing_docs, clippy::unwrap_used)]

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use trainsync::config::{StorageBackend, SyncConfig};
use trainsync::errors::ErrorCode;
use trainsync::queue::FailurePolicy;

const VARS: &[&str] = &[
    "TRAINSYNC_API_URL",
    "TRAINSYNC_ACCESS_TOKEN",
    "TRAINSYNC_STORAGE",
    "TRAINSYNC_DATA_DIR",
    "TRAINSYNC_ATTEMPT_TIMEOUT_SECS",
    "TRAINSYNC_FAILURE_POLICY",
    "TRAINSYNC_PROBE_INTERVAL_SECS",
    "TRAINSYNC_HTTP_TIMEOUT_SECS",
    "TRAINSYNC_HTTP_CONNECT_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_is_set() {
    clear_env();
    let config = SyncConfig::from_env().unwrap();

    assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
    assert_eq!(config.api.access_token, None);
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.api.connect_timeout_secs, 10);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.queue.failure_policy, FailurePolicy::RetryAll);
    assert_eq!(config.queue.attempt_timeout, Some(Duration::from_secs(30)));
    assert_eq!(
        config.connectivity.probe_interval,
        Some(Duration::from_secs(15))
    );
}

#[test]
#[serial]
fn test_all_variables_are_honoured() {
    clear_env();
    env::set_var("TRAINSYNC_API_URL", "https://api.example.test/v1");
    env::set_var("TRAINSYNC_ACCESS_TOKEN", "secret-token");
    env::set_var("TRAINSYNC_STORAGE", "sqlite");
    env::set_var("TRAINSYNC_DATA_DIR", "/var/lib/trainsync-test");
    env::set_var("TRAINSYNC_ATTEMPT_TIMEOUT_SECS", "5");
    env::set_var("TRAINSYNC_FAILURE_POLICY", "dead_letter");
    env::set_var("TRAINSYNC_PROBE_INTERVAL_SECS", "0");
    env::set_var("TRAINSYNC_HTTP_TIMEOUT_SECS", "12");
    env::set_var("TRAINSYNC_HTTP_CONNECT_TIMEOUT_SECS", "3");

    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.api.base_url, "https://api.example.test/v1");
    assert_eq!(config.api.access_token.as_deref(), Some("secret-token"));
    assert_eq!(config.api.timeout_secs, 12);
    assert_eq!(config.api.connect_timeout_secs, 3);
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(
        config.storage.data_dir,
        PathBuf::from("/var/lib/trainsync-test")
    );
    assert_eq!(config.queue.attempt_timeout, Some(Duration::from_secs(5)));
    assert_eq!(
        config.queue.failure_policy,
        FailurePolicy::DeadLetterTerminal
    );
    assert_eq!(config.connectivity.probe_interval, None);
}

#[test]
#[serial]
fn test_zero_attempt_timeout_means_unbounded() {
    clear_env();
    env::set_var("TRAINSYNC_ATTEMPT_TIMEOUT_SECS", "0");
    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.queue.attempt_timeout, None);
}

#[test]
#[serial]
fn test_blank_token_is_treated_as_signed_out() {
    clear_env();
    env::set_var("TRAINSYNC_ACCESS_TOKEN", "   ");
    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.api.access_token, None);
}

#[test]
#[serial]
fn test_malformed_number_is_a_config_error() {
    clear_env();
    env::set_var("TRAINSYNC_HTTP_TIMEOUT_SECS", "thirty");
    let err = SyncConfig::from_env().unwrap_err();
    clear_env();

    assert_eq!(err.code, ErrorCode::ConfigInvalid);
    assert!(err.message.contains("TRAINSYNC_HTTP_TIMEOUT_SECS"));
}

#[test]
#[serial]
fn test_unknown_storage_and_policy_fall_back_to_defaults() {
    clear_env();
    env::set_var("TRAINSYNC_STORAGE", "cloud");
    env::set_var("TRAINSYNC_FAILURE_POLICY", "drop");
    let config = SyncConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.queue.failure_policy, FailurePolicy::RetryAll);
}
