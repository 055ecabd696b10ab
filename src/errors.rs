// ABOUTME: Re-exports error types from trainsync-core for unified type identity
// ABOUTME: AppError, ErrorCode and RemoteError are the same types across the workspace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

pub use trainsync_core::errors::*;
