// ABOUTME: Re-exports mutation and payload models from trainsync-core
// ABOUTME: Ensures Mutation and QueuedMutation are the same type across all workspace crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

pub use trainsync_core::models::*;
