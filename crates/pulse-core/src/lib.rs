// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pulse-core
//!
//! Core types and shared abstractions for the pulse metrics engine.
//!
//! This crate provides the foundational pieces used across all pulse
//! components:
//!
//! - **Types**: `MetricKind`, the per-kind samples (`CpuSample`,
//!   `MemorySample`, `DiskSample`), the `MetricSample` sum type,
//!   `SystemSnapshot`, and the persisted `LogRow`
//! - **Error**: unified error hierarchy for settings and storage failures

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
