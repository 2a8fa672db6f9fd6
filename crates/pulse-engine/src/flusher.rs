// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-kind batch flusher.
//!
//! A flush drains the kind's queue in one atomic take and persists the
//! batch with a single bulk insert. Two triggers share one flusher
//! instance: the size-threshold check on the ingestion path and the
//! recurring timer. An in-flight flag serializes them — the later caller
//! observes the flag and returns without waiting.
//!
//! # Failure trade-off
//!
//! If the bulk insert fails, the already-drained batch is discarded. This
//! bounds memory during a storage outage at the cost of losing that batch;
//! the loss is logged and counted in [`FlushStatsSnapshot::samples_lost`].
//! There is deliberately no automatic retry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use pulse_core::types::MetricKind;
use pulse_store::settings::SettingsStore;
use pulse_store::traits::LogStore;

use crate::policy;
use crate::queue::SampleQueue;
use crate::task::PeriodicJob;

// =============================================================================
// Flush Outcome
// =============================================================================

/// What a single `flush()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch was persisted.
    Flushed(usize),
    /// The bulk insert failed and the batch was discarded.
    Lost(usize),
    /// Nothing was queued.
    Empty,
    /// Another flush for this kind was already running.
    InFlight,
}

// =============================================================================
// Flush Statistics
// =============================================================================

/// Lock-free per-flusher counters.
#[derive(Debug, Default)]
struct FlushStats {
    flushes: AtomicU64,
    flush_errors: AtomicU64,
    samples_flushed: AtomicU64,
    samples_lost: AtomicU64,
}

/// Immutable snapshot of one flusher's counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushStatsSnapshot {
    /// The metric kind.
    pub kind: MetricKind,
    /// Successful flush operations.
    pub flushes: u64,
    /// Failed flush operations.
    pub flush_errors: u64,
    /// Samples persisted (cumulative).
    pub samples_flushed: u64,
    /// Samples discarded after a failed insert (cumulative).
    pub samples_lost: u64,
    /// Samples ever queued (cumulative).
    pub samples_queued: u64,
    /// Samples currently awaiting a flush.
    pub pending: u64,
}

// =============================================================================
// Batch Flusher
// =============================================================================

/// Drains one kind's queue to durable storage.
pub struct BatchFlusher {
    kind: MetricKind,
    name: String,
    queue: Arc<SampleQueue>,
    store: Arc<dyn LogStore>,
    settings: Arc<dyn SettingsStore>,
    in_flight: AtomicBool,
    stats: FlushStats,
}

/// Clears the in-flight flag on every exit path, including panics.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchFlusher {
    /// Creates a flusher for `kind` over the given queue and backends.
    pub fn new(
        kind: MetricKind,
        queue: Arc<SampleQueue>,
        store: Arc<dyn LogStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            kind,
            name: format!("flush-{}", kind),
            queue,
            store,
            settings,
            in_flight: AtomicBool::new(false),
            stats: FlushStats::default(),
        }
    }

    /// The metric kind this flusher serves.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Drains the queue and bulk-inserts the batch.
    ///
    /// Safe to call at any time: a no-op when the queue is empty or when a
    /// flush for this kind is already in flight (the call returns, it does
    /// not wait and retry).
    pub async fn flush(&self) -> FlushOutcome {
        if self.queue.is_empty() {
            return FlushOutcome::Empty;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return FlushOutcome::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let batch = self.queue.drain_all();
        if batch.is_empty() {
            // Lost the race with a flush that drained between our check and
            // the flag acquisition.
            return FlushOutcome::Empty;
        }

        match self.store.insert_batch(&batch).await {
            Ok(()) => {
                self.stats.flushes.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .samples_flushed
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);

                debug!(kind = %self.kind, samples = batch.len(), "Flushed metric batch");
                FlushOutcome::Flushed(batch.len())
            }
            Err(e) => {
                self.stats.flush_errors.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .samples_lost
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);

                error!(
                    kind = %self.kind,
                    samples_lost = batch.len(),
                    error = %e,
                    "Flush failed; dropping drained batch"
                );
                FlushOutcome::Lost(batch.len())
            }
        }
    }

    /// Size-threshold trigger: flushes if the queue has reached the current
    /// batch size, read fresh from settings.
    ///
    /// Returns `None` when the queue is below the threshold.
    pub async fn flush_if_full(&self) -> Option<FlushOutcome> {
        let threshold = policy::batch_size(&*self.settings, self.kind).await;
        if (self.queue.len() as u32) < threshold {
            return None;
        }
        Some(self.flush().await)
    }

    /// Snapshot of this flusher's counters.
    pub fn stats(&self) -> FlushStatsSnapshot {
        FlushStatsSnapshot {
            kind: self.kind,
            flushes: self.stats.flushes.load(Ordering::Relaxed),
            flush_errors: self.stats.flush_errors.load(Ordering::Relaxed),
            samples_flushed: self.stats.samples_flushed.load(Ordering::Relaxed),
            samples_lost: self.stats.samples_lost.load(Ordering::Relaxed),
            samples_queued: self.queue.pushed_total(),
            pending: self.queue.len() as u64,
        }
    }
}

#[async_trait]
impl PeriodicJob for BatchFlusher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn delay(&self) -> Duration {
        policy::batch_interval(&*self.settings, self.kind).await
    }

    async fn run(&self) {
        self.flush().await;
    }
}

impl std::fmt::Debug for BatchFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFlusher")
            .field("kind", &self.kind)
            .field("pending", &self.queue.len())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
