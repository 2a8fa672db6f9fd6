// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Metrics logging service.
//!
//! Owns the full per-kind pipeline and its six recurring timers:
//!
//! ```text
//!   queue_metrics(snapshot)
//!        |  decompose
//!        v
//!   [cpu queue]  [memory queue]  [disk queue]
//!        |             |              |        <- threshold + timer
//!        v             v              v
//!   [cpu flush]  [memory flush]  [disk flush]
//!        |             |              |
//!        +------> LogStore <----------+
//!                     ^
//!   [cpu sweep]  [memory sweep]  [disk sweep]  <- retention timers
//! ```
//!
//! Shutdown cancels every timer first, waits for in-progress callbacks to
//! finish, then runs one final flush per kind so nothing queued is lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pulse_core::error::StoreResult;
use pulse_core::types::{LogRow, MetricKind, SystemSnapshot};
use pulse_store::settings::SettingsStore;
use pulse_store::traits::LogStore;

use crate::flusher::{BatchFlusher, FlushOutcome, FlushStatsSnapshot};
use crate::queue::SampleQueue;
use crate::sweeper::RetentionSweeper;
use crate::task::{spawn_periodic, TaskHandle};

// =============================================================================
// Cleanup Report
// =============================================================================

/// Rows deleted per kind by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// CPU rows deleted.
    pub cpu: u64,
    /// Memory rows deleted.
    pub memory: u64,
    /// Disk rows deleted.
    pub disk: u64,
}

impl CleanupReport {
    /// Total rows deleted across all kinds.
    pub fn total(&self) -> u64 {
        self.cpu + self.memory + self.disk
    }

    fn record(&mut self, kind: MetricKind, deleted: u64) {
        match kind {
            MetricKind::Cpu => self.cpu += deleted,
            MetricKind::Memory => self.memory += deleted,
            MetricKind::Disk => self.disk += deleted,
        }
    }
}

// =============================================================================
// Metrics Service
// =============================================================================

/// One queue/flusher/sweeper trio, fully isolated from the other kinds.
struct KindUnit {
    queue: Arc<SampleQueue>,
    flusher: Arc<BatchFlusher>,
    sweeper: Arc<RetentionSweeper>,
}

impl KindUnit {
    fn new(
        kind: MetricKind,
        store: Arc<dyn LogStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let queue = Arc::new(SampleQueue::new(kind));
        let flusher = Arc::new(BatchFlusher::new(
            kind,
            queue.clone(),
            store.clone(),
            settings.clone(),
        ));
        let sweeper = Arc::new(RetentionSweeper::new(kind, store, settings));
        Self {
            queue,
            flusher,
            sweeper,
        }
    }
}

/// Batching and retention engine for system metric snapshots.
///
/// Created via [`MetricsService::start`], which spawns the recurring flush
/// and sweep timers. Callers should hold the returned `Arc` and call
/// [`shutdown`](MetricsService::shutdown) before dropping it.
pub struct MetricsService {
    store: Arc<dyn LogStore>,
    units: [KindUnit; 3],
    tasks: Mutex<Vec<TaskHandle>>,
    shutdown_started: AtomicBool,
}

impl MetricsService {
    /// Builds the service and spawns one flush timer and one sweep timer
    /// per metric kind.
    pub fn start(store: Arc<dyn LogStore>, settings: Arc<dyn SettingsStore>) -> Arc<Self> {
        let units = MetricKind::ALL
            .map(|kind| KindUnit::new(kind, store.clone(), settings.clone()));

        let mut tasks = Vec::with_capacity(6);
        for unit in &units {
            tasks.push(spawn_periodic(unit.flusher.clone()));
            tasks.push(spawn_periodic(unit.sweeper.clone()));
        }

        info!(timers = tasks.len(), "Metrics service started");
        Arc::new(Self {
            store,
            units,
            tasks: Mutex::new(tasks),
            shutdown_started: AtomicBool::new(false),
        })
    }

    fn unit(&self, kind: MetricKind) -> &KindUnit {
        &self.units[kind.index()]
    }

    /// Enqueues one snapshot, fanning its samples out to the per-kind
    /// queues, then flushes any queue that has reached its batch size.
    ///
    /// The threshold check happens inline so the triggering sample is part
    /// of the batch it flushes. A queue already being flushed is skipped,
    /// not waited on.
    pub async fn queue_metrics(&self, snapshot: SystemSnapshot) {
        if self.shutdown_started.load(Ordering::SeqCst) {
            warn!("queue_metrics after shutdown; snapshot dropped");
            return;
        }

        for sample in snapshot.into_samples() {
            let kind = sample.kind();
            self.unit(kind).queue.push(sample);
        }

        // A shutdown may have started between the check above and the
        // pushes, in which case the final flushes can miss these samples.
        // If its flag is visible now, the pushes are visible to its drain;
        // if not, drain them here so nothing is stranded.
        if self.shutdown_started.load(Ordering::SeqCst) {
            for unit in &self.units {
                while !unit.queue.is_empty() {
                    if unit.flusher.flush().await == FlushOutcome::InFlight {
                        tokio::task::yield_now().await;
                    }
                }
            }
            return;
        }

        for unit in &self.units {
            unit.flusher.flush_if_full().await;
        }
    }

    /// Runs an on-demand retention sweep.
    ///
    /// Sweeps only `kind` when given, otherwise all three kinds in order.
    /// Unlike the background timers, storage errors surface to the caller;
    /// rows already deleted by earlier kinds stay deleted.
    pub async fn cleanup_old_logs(&self, kind: Option<MetricKind>) -> StoreResult<CleanupReport> {
        let mut report = CleanupReport::default();
        match kind {
            Some(kind) => {
                let deleted = self.unit(kind).sweeper.sweep().await?;
                report.record(kind, deleted);
            }
            None => {
                for unit in &self.units {
                    let deleted = unit.sweeper.sweep().await?;
                    report.record(unit.sweeper.kind(), deleted);
                }
            }
        }
        Ok(report)
    }

    /// Returns up to `limit` persisted rows of `kind`, newest-first,
    /// skipping `offset`. Queued samples not yet flushed are not visible.
    pub async fn recent_logs(
        &self,
        kind: MetricKind,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<LogRow>> {
        self.store.recent(kind, limit, offset).await
    }

    /// Returns persisted rows of `kind` whose sample timestamp falls within
    /// `start..=end`, newest-first, capped at `limit`.
    pub async fn logs_by_time_range(
        &self,
        kind: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> StoreResult<Vec<LogRow>> {
        self.store.range(kind, start, end, limit).await
    }

    /// Stops the service: cancels all six timers, waits for in-progress
    /// callbacks, then flushes whatever remains in each queue.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Metrics service shutting down");

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.shutdown().await;
        }

        // Timers are gone; these flushes cannot race a timer-driven one.
        for unit in &self.units {
            unit.flusher.flush().await;
        }
        info!("Metrics service stopped");
    }

    /// Counter snapshot for one kind's flusher.
    pub fn stats(&self, kind: MetricKind) -> FlushStatsSnapshot {
        self.unit(kind).flusher.stats()
    }

    /// Samples currently queued for `kind`.
    pub fn queue_len(&self, kind: MetricKind) -> usize {
        self.unit(kind).queue.len()
    }
}

impl std::fmt::Debug for MetricsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsService")
            .field(
                "shutdown_started",
                &self.shutdown_started.load(Ordering::Relaxed),
            )
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::types::{CpuSample, DiskSample, MemorySample, MetricSample};
    use pulse_store::memory::{MemoryLogStore, MemorySettingsStore};

    fn snapshot(with_disk: bool) -> SystemSnapshot {
        let now = Utc::now();
        SystemSnapshot {
            cpu: CpuSample {
                timestamp: now,
                usage_percent: 35.0,
                load_1m: 1.0,
                load_5m: 0.8,
                load_15m: 0.6,
                cores: Vec::new(),
            },
            memory: MemorySample {
                timestamp: now,
                usage_percent: 60.0,
                used_bytes: 6,
                total_bytes: 10,
                free_bytes: 4,
            },
            disk: with_disk.then(|| DiskSample {
                timestamp: now,
                usage_percent: 70.0,
                used_bytes: 7,
                total_bytes: 10,
                available_bytes: 3,
                partitions: Vec::new(),
            }),
        }
    }

    async fn service_fixture() -> (Arc<MetricsService>, Arc<MemoryLogStore>, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemoryLogStore::new());
        let settings = Arc::new(MemorySettingsStore::new());
        let service = MetricsService::start(store.clone(), settings.clone());
        (service, store, settings)
    }

    #[tokio::test]
    async fn test_snapshot_fans_out_per_kind() {
        let (service, _store, _settings) = service_fixture().await;

        service.queue_metrics(snapshot(false)).await;
        assert_eq!(service.queue_len(MetricKind::Cpu), 1);
        assert_eq!(service.queue_len(MetricKind::Memory), 1);
        assert_eq!(service.queue_len(MetricKind::Disk), 0);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_disk_default_threshold_flushes_immediately() {
        let (service, store, _settings) = service_fixture().await;

        // Disk defaults to a batch size of 1; cpu and memory to 10.
        service.queue_metrics(snapshot(true)).await;
        assert_eq!(service.queue_len(MetricKind::Disk), 0);
        assert_eq!(store.count(MetricKind::Disk), 1);
        assert_eq!(service.queue_len(MetricKind::Cpu), 1);
        assert_eq!(store.count(MetricKind::Cpu), 0);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_threshold_flush_is_exact() {
        let (service, store, settings) = service_fixture().await;
        settings.set("METRICS_LOG_BATCH_SIZE_CPU", "3").await.unwrap();
        settings.set("METRICS_LOG_BATCH_SIZE_MEMORY", "3").await.unwrap();

        service.queue_metrics(snapshot(false)).await;
        service.queue_metrics(snapshot(false)).await;
        assert_eq!(store.count(MetricKind::Cpu), 0);

        service.queue_metrics(snapshot(false)).await;
        assert_eq!(store.count(MetricKind::Cpu), 3);
        assert_eq!(store.count(MetricKind::Memory), 3);
        assert_eq!(service.queue_len(MetricKind::Cpu), 0);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queues() {
        let (service, store, _settings) = service_fixture().await;

        service.queue_metrics(snapshot(false)).await;
        service.queue_metrics(snapshot(false)).await;
        assert_eq!(store.count(MetricKind::Cpu), 0);

        service.shutdown().await;
        assert_eq!(store.count(MetricKind::Cpu), 2);
        assert_eq!(store.count(MetricKind::Memory), 2);
        assert_eq!(service.queue_len(MetricKind::Cpu), 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_blocks_ingest() {
        let (service, store, _settings) = service_fixture().await;

        service.queue_metrics(snapshot(false)).await;
        service.shutdown().await;
        service.shutdown().await;

        let flushed = store.samples_inserted();
        service.queue_metrics(snapshot(false)).await;
        assert_eq!(store.samples_inserted(), flushed);
        assert_eq!(service.queue_len(MetricKind::Cpu), 0);
    }

    #[tokio::test]
    async fn test_cleanup_single_kind_and_all() {
        let (service, store, settings) = service_fixture().await;
        for kind in ["CPU", "MEMORY", "DISK"] {
            settings
                .set(&format!("METRICS_LOG_RETENTION_DAYS_{kind}"), "7")
                .await
                .unwrap();
        }

        let old = Utc::now() - chrono::Duration::days(10);
        store.seed_row(MetricSample::Cpu(CpuSample {
            timestamp: old,
            usage_percent: 1.0,
            load_1m: 0.0,
            load_5m: 0.0,
            load_15m: 0.0,
            cores: Vec::new(),
        }));
        store.seed_row(MetricSample::Memory(MemorySample {
            timestamp: old,
            usage_percent: 1.0,
            used_bytes: 1,
            total_bytes: 2,
            free_bytes: 1,
        }));

        let report = service.cleanup_old_logs(Some(MetricKind::Cpu)).await.unwrap();
        assert_eq!(report, CleanupReport { cpu: 1, memory: 0, disk: 0 });

        let report = service.cleanup_old_logs(None).await.unwrap();
        assert_eq!(report.memory, 1);
        assert_eq!(report.total(), 1);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_cleanup_surfaces_store_errors() {
        let (service, store, _settings) = service_fixture().await;
        store.set_fail_deletes(true);

        assert!(service.cleanup_old_logs(None).await.is_err());

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_read_paths_delegate_to_store() {
        let (service, store, _settings) = service_fixture().await;

        let now = Utc::now();
        for minutes in [30, 20, 10] {
            store.seed_row(MetricSample::Memory(MemorySample {
                timestamp: now - chrono::Duration::minutes(minutes),
                usage_percent: minutes as f64,
                used_bytes: 1,
                total_bytes: 2,
                free_bytes: 1,
            }));
        }

        let rows = service.recent_logs(MetricKind::Memory, 2, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].sample.timestamp() > rows[1].sample.timestamp());

        let rows = service
            .logs_by_time_range(
                MetricKind::Memory,
                now - chrono::Duration::minutes(25),
                now,
                10,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        service.shutdown().await;
    }
}
