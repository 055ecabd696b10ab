// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Storage keys, backend endpoints, defaults and user-facing notices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large namespace.

/// Durable storage keys
pub mod storage_keys {
    /// Ordered list of pending mutations
    pub const MUTATION_QUEUE: &str = "mutation_queue";
    /// Mutations set aside as permanently undeliverable
    pub const DEAD_LETTERS: &str = "mutation_dead_letters";
    /// Persisted read cache snapshot
    pub const QUERY_CACHE: &str = "query_cache";
    /// Suffix appended to a key when an unreadable value is set aside
    pub const CORRUPT_SUFFIX: &str = ".corrupt";
}

/// Backend endpoints used by the write API
pub mod endpoints {
    /// Multipart exercise creation
    pub const EXERCISE_CREATE: &str = "/exercise-create";
    /// JSON training plan creation
    pub const TRAINING_CREATE: &str = "/training-create";
    /// JSON training session save
    pub const TRAINING_SAVE: &str = "/training-save";
}

/// Default configuration values
pub mod defaults {
    /// Backend base URL used when none is configured
    pub const API_BASE_URL: &str = "http://127.0.0.1:8000";
    /// Upper bound for a single replay attempt
    pub const ATTEMPT_TIMEOUT_SECS: u64 = 30;
    /// Whole-request timeout of the shared HTTP client
    pub const HTTP_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout of the shared HTTP client
    pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Interval between reachability probes
    pub const PROBE_INTERVAL_SECS: u64 = 15;
    /// Default rest between exercises of a training plan
    pub const BREAK_TIME_SECS: u32 = 60;
    /// Capacity of the queue event broadcast channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
    /// Capacity of the connectivity transition channel
    pub const CONNECTIVITY_CHANNEL_CAPACITY: usize = 32;
    /// File name of the `SQLite` storage backend
    pub const SQLITE_FILE_NAME: &str = "trainsync.db";
    /// Directory name under the platform data dir
    pub const DATA_DIR_NAME: &str = "trainsync";
    /// Maximum response body length kept in a status error
    pub const ERROR_BODY_MAX_LEN: usize = 512;
}

/// Read cache timings, mirroring the client's query cache
pub mod cache {
    /// Entries younger than this are served as fresh (5 minutes)
    pub const STALE_TIME_SECS: u64 = 300;
    /// Entries older than this are dropped (24 hours)
    pub const GC_TIME_SECS: u64 = 86_400;
    /// Maximum number of cached queries
    pub const MAX_ENTRIES: usize = 512;
    /// Stale window for training plan lists (24 hours)
    pub const TRAININGS_STALE_TIME_SECS: u64 = 86_400;
    /// Stale window for training categories (7 days)
    pub const CATEGORIES_STALE_TIME_SECS: u64 = 604_800;
    /// Stale window for recommendations (15 minutes)
    pub const RECOMMENDATIONS_STALE_TIME_SECS: u64 = 900;
}

/// Query key prefixes of cached reads
pub mod query_keys {
    /// Training plans and their details
    pub const TRAININGS: &str = "trainings";
    /// Exercise catalogue
    pub const EXERCISES: &str = "exercises";
    /// User profiles and statistics
    pub const USERS: &str = "users";
    /// Training categories
    pub const TRAINING_CATEGORIES: &str = "training-categories";
}

/// User-facing notices attached to queue events
pub mod notices {
    /// Shown once when a write is queued
    pub const QUEUED: &str =
        "Action saved locally. It will be sent as soon as you are back online.";
    /// Shown while offline
    pub const OFFLINE_BANNER: &str = "Offline mode - changes are stored locally";
    /// Shown when the device comes back online
    pub const ONLINE: &str = "Back online";
}

/// Service names for structured logging
pub mod service_names {
    /// Name reported in startup logs
    pub const TRAINSYNC: &str = "trainsync";
}
