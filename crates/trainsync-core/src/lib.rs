// ABOUTME: Core types and constants for the trainsync offline mutation queue
// ABOUTME: Foundation crate with error handling, constants, and mutation data models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

#![deny(unsafe_code)]

//! # Trainsync Core
//!
//! Foundation crate providing shared types and constants for the trainsync
//! offline write queue. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `RemoteError`
//! - **constants**: Storage keys, endpoints, defaults and user-facing notices
//! - **models**: Queued mutations and their per-kind payloads

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Mutation records and payload models (exercise, training plan, training session)
pub mod models;
