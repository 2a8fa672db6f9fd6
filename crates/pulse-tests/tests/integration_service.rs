// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Service Integration Tests
//!
//! End-to-end tests for the metrics service:
//!
//! - Snapshot fan-out and threshold flushing
//! - Sample conservation under concurrent producers
//! - Per-kind flush serialization
//! - Timer behavior with a paused clock
//! - Graceful shutdown
//!
//! ## Test Categories
//!
//! - `test_service_*`: Full-pipeline behavior
//! - `test_timer_*`: Paused-clock timer tests

use std::sync::Arc;
use std::time::Duration;

use pulse_core::types::MetricKind;
use pulse_engine::MetricsService;
use pulse_store::memory::{MemoryLogStore, MemorySettingsStore};
use pulse_store::SettingsStore;

use pulse_tests::common::{init_test_logging, SnapshotBuilder};

// =============================================================================
// Helper Functions
// =============================================================================

fn new_service() -> (
    Arc<MetricsService>,
    Arc<MemoryLogStore>,
    Arc<MemorySettingsStore>,
) {
    let store = Arc::new(MemoryLogStore::new());
    let settings = Arc::new(MemorySettingsStore::new());
    let service = MetricsService::start(store.clone(), settings.clone());
    (service, store, settings)
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_service_threshold_flush_is_exact() {
    init_test_logging();
    let (service, store, settings) = new_service();
    settings.set("METRICS_LOG_BATCH_SIZE_CPU", "4").await.unwrap();
    settings.set("METRICS_LOG_BATCH_SIZE_MEMORY", "4").await.unwrap();

    for _ in 0..3 {
        service.queue_metrics(SnapshotBuilder::new().build()).await;
    }
    assert_eq!(store.insert_calls(), 0);
    assert_eq!(service.queue_len(MetricKind::Cpu), 3);

    service.queue_metrics(SnapshotBuilder::new().build()).await;
    assert_eq!(store.count(MetricKind::Cpu), 4);
    assert_eq!(store.count(MetricKind::Memory), 4);
    assert_eq!(service.queue_len(MetricKind::Cpu), 0);

    service.shutdown().await;
}

#[tokio::test]
async fn test_service_conserves_samples_under_concurrency() {
    init_test_logging();
    let (service, store, _settings) = new_service();

    let mut producers = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..25 {
                service.queue_metrics(SnapshotBuilder::new().build()).await;
            }
        }));
    }
    for p in producers {
        p.await.unwrap();
    }
    service.shutdown().await;

    // Every queued sample was persisted exactly once: 200 cpu + 200 memory.
    assert_eq!(store.samples_inserted(), 400);
    assert_eq!(service.queue_len(MetricKind::Cpu), 0);
    assert_eq!(service.queue_len(MetricKind::Memory), 0);

    for kind in [MetricKind::Cpu, MetricKind::Memory] {
        let stats = service.stats(kind);
        assert_eq!(stats.samples_queued, 200);
        assert_eq!(stats.samples_flushed, 200);
        assert_eq!(stats.samples_lost, 0);
        assert_eq!(stats.pending, 0);
    }
}

#[tokio::test]
async fn test_service_flushes_never_overlap_per_kind() {
    init_test_logging();
    let (service, store, settings) = new_service();
    settings.set("METRICS_LOG_BATCH_SIZE_CPU", "1").await.unwrap();
    settings.set("METRICS_LOG_BATCH_SIZE_MEMORY", "1").await.unwrap();
    store.set_insert_delay(Duration::from_millis(10));

    let mut producers = Vec::new();
    for _ in 0..6 {
        let service = service.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..5 {
                service.queue_metrics(SnapshotBuilder::new().build()).await;
            }
        }));
    }
    for p in producers {
        p.await.unwrap();
    }
    service.shutdown().await;

    assert!(!store.overlap_detected());
    assert_eq!(store.samples_inserted(), 60);
}

#[tokio::test]
async fn test_service_uses_defaults_during_settings_outage() {
    init_test_logging();
    let (service, store, settings) = new_service();
    settings.set_unavailable(true);

    // Cpu and memory default to a batch size of 10.
    for _ in 0..9 {
        service.queue_metrics(SnapshotBuilder::new().build()).await;
    }
    assert_eq!(store.insert_calls(), 0);

    service.queue_metrics(SnapshotBuilder::new().build()).await;
    assert_eq!(store.count(MetricKind::Cpu), 10);
    assert_eq!(store.count(MetricKind::Memory), 10);

    service.shutdown().await;
}

#[tokio::test]
async fn test_service_shutdown_drains_and_rejects_ingest() {
    init_test_logging();
    let (service, store, _settings) = new_service();

    for _ in 0..3 {
        service.queue_metrics(SnapshotBuilder::new().with_disk().build()).await;
    }
    // Disk flushes inline at its default batch size of 1.
    assert_eq!(store.count(MetricKind::Disk), 3);
    assert_eq!(store.count(MetricKind::Cpu), 0);

    service.shutdown().await;
    assert_eq!(store.count(MetricKind::Cpu), 3);
    assert_eq!(store.count(MetricKind::Memory), 3);

    // Ingest after shutdown is dropped, not queued.
    service.queue_metrics(SnapshotBuilder::new().build()).await;
    assert_eq!(service.queue_len(MetricKind::Cpu), 0);
    assert_eq!(store.samples_inserted(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_service_ingest_racing_shutdown_strands_nothing() {
    init_test_logging();
    let (service, store, _settings) = new_service();

    let mut producers = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..50 {
                service.queue_metrics(SnapshotBuilder::new().build()).await;
            }
        }));
    }
    let stopper = {
        let service = service.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            service.shutdown().await;
        })
    };
    for p in producers {
        p.await.unwrap();
    }
    stopper.await.unwrap();

    // Snapshots arriving after shutdown are dropped before the push, so
    // every sample that entered a queue must be persisted; none stranded.
    let mut persisted = 0;
    for kind in [MetricKind::Cpu, MetricKind::Memory] {
        assert_eq!(service.queue_len(kind), 0);
        let stats = service.stats(kind);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.samples_lost, 0);
        assert_eq!(stats.samples_queued, stats.samples_flushed);
        persisted += stats.samples_flushed;
    }
    assert_eq!(store.samples_inserted(), persisted);
}

// =============================================================================
// Paused-Clock Timer Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_timer_flush_fires_on_interval() {
    let (service, store, settings) = new_service();
    settings
        .set("METRICS_LOG_BATCH_INTERVAL_MS_CPU", "30000")
        .await
        .unwrap();

    service.queue_metrics(SnapshotBuilder::new().build()).await;
    assert_eq!(store.count(MetricKind::Cpu), 0);

    tokio::time::sleep(Duration::from_millis(30_010)).await;
    assert_eq!(store.count(MetricKind::Cpu), 1);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timer_interval_change_applies_next_cycle() {
    let (service, store, settings) = new_service();
    settings
        .set("METRICS_LOG_BATCH_INTERVAL_MS_CPU", "30000")
        .await
        .unwrap();

    service.queue_metrics(SnapshotBuilder::new().build()).await;

    // Shorten the interval mid-sleep. The running cycle keeps its original
    // schedule; the new value is read right after it fires.
    tokio::time::sleep(Duration::from_secs(29)).await;
    settings
        .set("METRICS_LOG_BATCH_INTERVAL_MS_CPU", "5000")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1_010)).await;
    assert_eq!(store.count(MetricKind::Cpu), 1);

    service.queue_metrics(SnapshotBuilder::new().build()).await;
    tokio::time::sleep(Duration::from_millis(5_010)).await;
    assert_eq!(store.count(MetricKind::Cpu), 2);

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timer_stops_after_shutdown() {
    let (service, store, settings) = new_service();
    settings
        .set("METRICS_LOG_BATCH_INTERVAL_MS_CPU", "1000")
        .await
        .unwrap();
    settings
        .set("METRICS_LOG_BATCH_INTERVAL_MS_MEMORY", "1000")
        .await
        .unwrap();

    service.queue_metrics(SnapshotBuilder::new().build()).await;
    service.shutdown().await;
    assert_eq!(store.samples_inserted(), 2);

    let calls_after_shutdown = store.total_calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(store.total_calls(), calls_after_shutdown);
}
