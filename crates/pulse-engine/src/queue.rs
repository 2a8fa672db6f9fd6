// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-kind in-memory sample queue.
//!
//! Each metric kind owns one queue, mutated from exactly two call sites:
//! the ingestion path appends, a flush drains. `drain_all` is an atomic
//! take-all, so a push racing a drain lands either in the drained batch or
//! in the fresh queue — never both, never neither.

use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use pulse_core::types::{MetricKind, MetricSample};

/// An ordered, unbounded buffer of samples awaiting persistence.
///
/// `len()` is O(1) via an atomic counter kept consistent under the queue
/// lock.
#[derive(Debug)]
pub struct SampleQueue {
    kind: MetricKind,
    items: Mutex<Vec<MetricSample>>,
    len: AtomicUsize,
    /// Samples ever pushed (cumulative; conservation-law accounting).
    pushed_total: AtomicU64,
}

impl SampleQueue {
    /// Creates an empty queue for `kind`.
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            items: Mutex::new(Vec::new()),
            len: AtomicUsize::new(0),
            pushed_total: AtomicU64::new(0),
        }
    }

    /// The metric kind this queue buffers.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Appends a sample.
    pub fn push(&self, sample: MetricSample) {
        debug_assert_eq!(sample.kind(), self.kind);

        let mut items = self.items.lock();
        items.push(sample);
        self.len.store(items.len(), Ordering::Release);
        self.pushed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically removes and returns everything currently queued.
    ///
    /// Never drains partially: the queue is left empty.
    pub fn drain_all(&self) -> Vec<MetricSample> {
        let mut items = self.items.lock();
        let batch = mem::take(&mut *items);
        self.len.store(0, Ordering::Release);
        batch
    }

    /// Current queue length (O(1)).
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if nothing is queued (O(1)).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples ever pushed onto this queue (cumulative).
    pub fn pushed_total(&self) -> u64 {
        self.pushed_total.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
