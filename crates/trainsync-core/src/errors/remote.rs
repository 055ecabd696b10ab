// ABOUTME: Error type for remote write API calls with retry classification
// ABOUTME: Distinguishes transient failures (retry later) from terminal rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the queue should treat a failed replay attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Connectivity, timeout or server-side problem; the same request may succeed later
    Transient,
    /// The backend rejected the request itself; replaying it unchanged will fail again
    Terminal,
}

/// Failure of a single remote write
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level failure (DNS, refused connection, reset)
    #[error("network error: {message}")]
    Network {
        /// Transport error description
        message: String,
    },

    /// The attempt did not complete within the configured bound
    #[error("request timed out after {after_ms} ms")]
    Timeout {
        /// Elapsed bound in milliseconds
        after_ms: u64,
    },

    /// The backend answered with a non-success status
    #[error("backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// A local file referenced by the payload could not be read
    #[error("attachment {path} unreadable: {reason}")]
    Attachment {
        /// Local path from the payload
        path: String,
        /// Underlying I/O failure
        reason: String,
    },
}

impl RemoteError {
    /// Create a network error
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a status error
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Classify the failure for the replay path
    ///
    /// 401 and 403 count as transient: the access token is refreshed outside
    /// the queue and the same request is expected to pass afterwards.
    #[must_use]
    pub const fn classification(&self) -> FailureClass {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => FailureClass::Transient,
            Self::Status { status, .. } => match *status {
                401 | 403 | 408 | 429 => FailureClass::Transient,
                400..=499 => FailureClass::Terminal,
                _ => FailureClass::Transient,
            },
            Self::Attachment { .. } => FailureClass::Terminal,
        }
    }

    /// Whether replaying the same mutation later can succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.classification(), FailureClass::Transient)
    }

    /// HTTP status code when the backend answered
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(feature = "remote-errors")]
impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout { after_ms: 0 };
        }
        if let Some(status) = error.status() {
            return Self::status(status.as_u16(), error.to_string());
        }
        Self::network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejection_is_terminal() {
        assert_eq!(
            RemoteError::status(400, "bad category").classification(),
            FailureClass::Terminal
        );
        assert_eq!(
            RemoteError::status(422, "").classification(),
            FailureClass::Terminal
        );
    }

    #[test]
    fn test_server_and_transport_failures_are_transient() {
        assert!(RemoteError::status(503, "").is_retryable());
        assert!(RemoteError::status(500, "").is_retryable());
        assert!(RemoteError::network("connection refused").is_retryable());
        assert!(RemoteError::Timeout { after_ms: 30_000 }.is_retryable());
    }

    #[test]
    fn test_auth_and_throttling_are_transient() {
        for status in [401, 403, 408, 429] {
            assert!(RemoteError::status(status, "").is_retryable(), "{status}");
        }
    }

    #[test]
    fn test_missing_attachment_is_terminal() {
        let err = RemoteError::Attachment {
            path: "/tmp/gone.jpg".to_owned(),
            reason: "No such file".to_owned(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), None);
    }
}
