// ABOUTME: Re-exports constants from trainsync-core
// ABOUTME: Storage keys, endpoints, defaults and notices shared across the workspace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

pub use trainsync_core::constants::*;
