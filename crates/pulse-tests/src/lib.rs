// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Pulse Integration Tests
//!
//! Integration tests for the pulse metrics batching and retention engine.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `builders`: Builders for snapshots and samples
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p pulse-tests
//!
//! # Run specific test suite
//! cargo test -p pulse-tests --test integration_service
//! cargo test -p pulse-tests --test integration_store
//!
//! # Run with verbose output
//! cargo test -p pulse-tests -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! ### Service Tests (`integration_service.rs`)
//! - Snapshot fan-out and threshold flushing
//! - Sample conservation under concurrent producers
//! - Flush serialization per kind
//! - Timer behavior with a paused clock
//! - Graceful shutdown
//!
//! ### Store Tests (`integration_store.rs`)
//! - SQLite persistence and reopen
//! - Retention cutoff semantics
//! - Time-range and paging queries

pub mod common;
