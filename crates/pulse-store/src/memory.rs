// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory store implementations for testing.
//!
//! `MemoryLogStore` is an instrumented [`LogStore`]:
//!
//! - Configurable failure injection for insert and delete paths
//! - Optional artificial insert latency, for holding a flush open
//! - Overlap detection: records whether two inserts for the same metric
//!   kind were ever in flight at once
//! - Interaction counters for verification
//!
//! `MemorySettingsStore` is a [`SettingsStore`] backed by a hash map with a
//! switchable "backend unavailable" mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use pulse_core::error::{SettingsResult, SettingsError, StoreError, StoreResult};
use pulse_core::types::{LogRow, MetricKind, MetricSample};

use crate::settings::SettingsStore;
use crate::traits::LogStore;

// =============================================================================
// Memory Log Store
// =============================================================================

/// An in-memory, instrumented [`LogStore`] for testing.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    rows: RwLock<Vec<LogRow>>,
    next_id: AtomicI64,

    /// Whether inserts should fail.
    fail_inserts: AtomicBool,
    /// Whether deletes should fail.
    fail_deletes: AtomicBool,
    /// Artificial latency applied to each insert.
    insert_delay: Mutex<Duration>,

    /// Per-kind insert-in-progress flags for overlap detection.
    entered: [AtomicBool; 3],
    /// Set if two same-kind inserts ever overlapped.
    overlap_detected: AtomicBool,

    insert_calls: AtomicU64,
    delete_calls: AtomicU64,
    query_calls: AtomicU64,
    samples_inserted: AtomicU64,
}

impl MemoryLogStore {
    /// Creates an empty store that succeeds on every call.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Sets whether inserts should fail.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::Relaxed);
    }

    /// Sets whether deletes should fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::Relaxed);
    }

    /// Sets an artificial latency for inserts.
    pub fn set_insert_delay(&self, delay: Duration) {
        *self.insert_delay.lock() = delay;
    }

    /// Returns `true` if two same-kind inserts ever ran concurrently.
    pub fn overlap_detected(&self) -> bool {
        self.overlap_detected.load(Ordering::SeqCst)
    }

    /// Number of `insert_batch` calls (including failed ones).
    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::Relaxed)
    }

    /// Number of `delete_older_than` calls (including failed ones).
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    /// Total storage calls of any kind.
    pub fn total_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::Relaxed)
            + self.delete_calls.load(Ordering::Relaxed)
            + self.query_calls.load(Ordering::Relaxed)
    }

    /// Number of samples successfully persisted.
    pub fn samples_inserted(&self) -> u64 {
        self.samples_inserted.load(Ordering::Relaxed)
    }

    /// Number of rows currently persisted for `kind`.
    pub fn count(&self, kind: MetricKind) -> usize {
        self.rows.read().iter().filter(|r| r.kind == kind).count()
    }

    /// Inserts a row directly with an explicit sample timestamp (fixture
    /// setup for retention tests).
    pub fn seed_row(&self, sample: MetricSample) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let row = LogRow {
            id,
            kind: sample.kind(),
            sample,
            created_at: Utc::now(),
        };
        self.rows.write().push(row);
        id
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert_batch(&self, batch: &[MetricSample]) -> StoreResult<()> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);

        if batch.is_empty() {
            return Ok(());
        }

        // Mark every kind present in the batch as entered; a flag that was
        // already set means a same-kind insert is still running.
        let mut marked = [false; 3];
        for sample in batch {
            let idx = sample.kind().index();
            if !marked[idx] {
                marked[idx] = true;
                if self.entered[idx].swap(true, Ordering::SeqCst) {
                    self.overlap_detected.store(true, Ordering::SeqCst);
                }
            }
        }

        let delay = *self.insert_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_inserts.load(Ordering::Relaxed) {
            Err(StoreError::insert_failed("injected insert failure"))
        } else {
            let created_at = Utc::now();
            let mut rows = self.rows.write();
            for sample in batch {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                rows.push(LogRow {
                    id,
                    kind: sample.kind(),
                    sample: sample.clone(),
                    created_at,
                });
            }
            self.samples_inserted.fetch_add(batch.len() as u64, Ordering::Relaxed);
            Ok(())
        };

        for (idx, was_marked) in marked.iter().enumerate() {
            if *was_marked {
                self.entered[idx].store(false, Ordering::SeqCst);
            }
        }

        result
    }

    async fn delete_older_than(&self, kind: MetricKind, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_deletes.load(Ordering::Relaxed) {
            return Err(StoreError::delete_failed("injected delete failure"));
        }

        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| r.kind != kind || r.sample.timestamp() >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn recent(&self, kind: MetricKind, limit: u32, offset: u32) -> StoreResult<Vec<LogRow>> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);

        let mut matching: Vec<LogRow> = self
            .rows
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.sample
                .timestamp()
                .cmp(&a.sample.timestamp())
                .then(b.id.cmp(&a.id))
        });

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn range(
        &self,
        kind: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> StoreResult<Vec<LogRow>> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);

        let mut matching: Vec<LogRow> = self
            .rows
            .read()
            .iter()
            .filter(|r| {
                r.kind == kind && r.sample.timestamp() >= start && r.sample.timestamp() <= end
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.sample
                .timestamp()
                .cmp(&a.sample.timestamp())
                .then(b.id.cmp(&a.id))
        });

        matching.truncate(limit as usize);
        Ok(matching)
    }
}

// =============================================================================
// Memory Settings Store
// =============================================================================

/// An in-memory [`SettingsStore`] with switchable backend-outage simulation.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemorySettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the backend becoming unreachable (or reachable again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SettingsError::unavailable("simulated outage"));
        }
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SettingsError::unavailable("simulated outage"));
        }
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
