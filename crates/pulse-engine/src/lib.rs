// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # pulse-engine
//!
//! Metrics batching and retention engine.
//!
//! The engine ingests system snapshots from an external sampler, buffers
//! them per metric kind, flushes each buffer to durable storage in bulk
//! (by size threshold or timer), and prunes persisted rows past a per-kind
//! retention cutoff:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       MetricsService                         │
//! │                                                              │
//! │   queue_metrics(snapshot)                                    │
//! │        │ split per kind                                      │
//! │        ▼                                                     │
//! │  ┌───────────┐ size / timer ┌──────────────┐   bulk insert   │
//! │  │SampleQueue│─────────────▶│ BatchFlusher │────────────────▶│──▶ LogStore
//! │  │   (×3)    │              │     (×3)     │                 │
//! │  └───────────┘              └──────────────┘                 │
//! │                             ┌────────────────┐ range delete  │
//! │                    timer───▶│RetentionSweeper│──────────────▶│──▶ LogStore
//! │                             │      (×3)      │               │
//! │                             └────────────────┘               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! CPU, memory, and disk are fully isolated state machines: independent
//! queues, in-flight flags, and timers, with no cross-kind lock. Policy
//! values (batch size, intervals, retention) are re-read from the settings
//! store on every decision, so runtime changes apply without a restart.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod flusher;
pub mod policy;
pub mod queue;
pub mod service;
pub mod sweeper;
pub mod task;

pub use flusher::{BatchFlusher, FlushOutcome, FlushStatsSnapshot};
pub use policy::FlushPolicy;
pub use queue::SampleQueue;
pub use service::{CleanupReport, MetricsService};
pub use sweeper::RetentionSweeper;
pub use task::{spawn_periodic, PeriodicJob, TaskHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
