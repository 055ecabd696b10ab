// ABOUTME: Re-exports command modules for trainsync-cli
// ABOUTME: Provides access to queue and dead-letter commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

pub mod dead_letters;
pub mod queue;
