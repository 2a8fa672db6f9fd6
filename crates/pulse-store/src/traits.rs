// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Durable log storage seam.
//!
//! One bulk-insert call per flush, one range-delete call per sweep, and
//! time-ordered read queries — that is the entire surface the engine needs
//! from its storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pulse_core::error::StoreResult;
use pulse_core::types::{LogRow, MetricKind, MetricSample};

/// Append-friendly durable storage for persisted metric samples.
///
/// # Implementation Requirements
///
/// - `insert_batch` must persist the whole batch in a single storage call,
///   assigning each row a unique id and a creation timestamp
/// - `delete_older_than` compares against the *sample* timestamp, strictly
///   less than the cutoff
/// - read queries return rows newest-first and never error on an empty
///   result set
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persists a batch of samples in one bulk insert.
    ///
    /// An empty batch is a no-op.
    async fn insert_batch(&self, batch: &[MetricSample]) -> StoreResult<()>;

    /// Deletes rows of `kind` whose sample timestamp is strictly older than
    /// `cutoff`. Returns the number of rows removed.
    async fn delete_older_than(&self, kind: MetricKind, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    /// Returns up to `limit` rows of `kind`, newest-first, skipping `offset`.
    async fn recent(&self, kind: MetricKind, limit: u32, offset: u32) -> StoreResult<Vec<LogRow>>;

    /// Returns rows of `kind` with `start <= sample timestamp <= end`,
    /// newest-first, capped at `limit`.
    async fn range(
        &self,
        kind: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> StoreResult<Vec<LogRow>>;
}
