// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pulse-store
//!
//! External-collaborator seams for the pulse metrics engine.
//!
//! The engine consumes two backends via traits only:
//!
//! - **`SettingsStore`**: typed key-value configuration lookups. Policy
//!   values (batch size, flush interval, retention) are re-read on every
//!   decision, so runtime changes take effect without a restart.
//! - **`LogStore`**: durable, append-friendly storage with bulk insert,
//!   range delete, and time-ordered range queries.
//!
//! `SqliteLogStore` is the production implementation; the in-memory
//! implementations exist for testing and for settings-store stand-ins.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod memory;
pub mod settings;
pub mod sqlite;
pub mod traits;

pub use memory::{MemoryLogStore, MemorySettingsStore};
pub use settings::SettingsStore;
pub use sqlite::SqliteLogStore;
pub use traits::LogStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
