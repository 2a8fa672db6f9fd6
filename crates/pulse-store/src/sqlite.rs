// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SQLite-backed log storage.
//!
//! Persists metric samples in a single `metric_logs` table with the sample
//! payload stored as JSON. The sample timestamp is duplicated into an
//! indexed integer column (unix milliseconds) so that range deletes and
//! time-ordered queries never have to touch the payload.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use pulse_core::error::{StoreError, StoreResult};
use pulse_core::types::{LogRow, MetricKind, MetricSample};

use crate::traits::LogStore;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metric_logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    kind       TEXT    NOT NULL,
    sample_ts  INTEGER NOT NULL,
    payload    TEXT    NOT NULL,
    created_at INTEGER NOT NULL
)
"#;

const CREATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_metric_logs_kind_ts
    ON metric_logs (kind, sample_ts)
"#;

/// SQLite implementation of [`LogStore`].
///
/// # Example
///
/// ```rust,ignore
/// use pulse_store::SqliteLogStore;
///
/// let store = SqliteLogStore::open("/var/lib/pulse/metrics.db").await?;
/// store.insert_batch(&samples).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    /// Opens (creating if necessary) a database file and ensures the schema.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::database_with("failed to open database", e))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory database (testing and development).
    ///
    /// Pinned to a single connection: an in-memory SQLite database is
    /// per-connection, so a larger pool would see empty databases.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(":memory:")
            .await
            .map_err(|e| StoreError::database_with("failed to open in-memory database", e))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::database_with("failed to create schema", e))?;
        }
        Ok(())
    }

    fn decode_row(row: SqliteRow) -> StoreResult<LogRow> {
        let id: i64 = row.get("id");
        let kind_raw: String = row.get("kind");
        let payload: String = row.get("payload");
        let created_ms: i64 = row.get("created_at");

        let kind = MetricKind::parse(&kind_raw)
            .ok_or_else(|| StoreError::corrupted_row(id, format!("unknown kind '{}'", kind_raw)))?;

        let sample: MetricSample = serde_json::from_str(&payload)
            .map_err(|e| StoreError::corrupted_row(id, format!("bad payload: {}", e)))?;

        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
            .ok_or_else(|| StoreError::corrupted_row(id, "created_at out of range"))?;

        Ok(LogRow { id, kind, sample, created_at })
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert_batch(&self, batch: &[MetricSample]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // Serialize up front so a bad sample fails before anything is written.
        let mut encoded = Vec::with_capacity(batch.len());
        for sample in batch {
            let payload = serde_json::to_string(sample)
                .map_err(|e| StoreError::insert_failed_with("failed to encode sample", e))?;
            encoded.push((sample.kind(), sample.timestamp().timestamp_millis(), payload));
        }

        let created_ms = Utc::now().timestamp_millis();

        // One multi-row statement per flush. Batch sizes here are small
        // (tens of rows), well under SQLite's bind parameter limit.
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO metric_logs (kind, sample_ts, payload, created_at) ");
        builder.push_values(&encoded, |mut b, (kind, sample_ms, payload)| {
            b.push_bind(kind.as_str())
                .push_bind(sample_ms)
                .push_bind(payload)
                .push_bind(created_ms);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::insert_failed_with("bulk insert failed", e))?;

        debug!(rows = batch.len(), "Inserted metric log batch");
        Ok(())
    }

    async fn delete_older_than(&self, kind: MetricKind, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM metric_logs WHERE kind = ? AND sample_ts < ?")
            .bind(kind.as_str())
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::delete_failed_with("range delete failed", e))?;

        Ok(result.rows_affected())
    }

    async fn recent(&self, kind: MetricKind, limit: u32, offset: u32) -> StoreResult<Vec<LogRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, payload, created_at
            FROM metric_logs
            WHERE kind = ?
            ORDER BY sample_ts DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(kind.as_str())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query_failed_with("recent query failed", e))?;

        rows.into_iter().map(Self::decode_row).collect()
    }

    async fn range(
        &self,
        kind: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> StoreResult<Vec<LogRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, payload, created_at
            FROM metric_logs
            WHERE kind = ? AND sample_ts >= ? AND sample_ts <= ?
            ORDER BY sample_ts DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(kind.as_str())
        .bind(start.timestamp_millis())
        .bind(end.timestamp_millis())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query_failed_with("range query failed", e))?;

        rows.into_iter().map(Self::decode_row).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
