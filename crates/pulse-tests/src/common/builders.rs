// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builders for constructing snapshots and samples with sensible defaults,
//! so tests only spell out the fields they actually assert on.

use chrono::{DateTime, Utc};

use pulse_core::types::{
    CoreUsage, CpuSample, DiskSample, MemorySample, MetricSample, PartitionUsage, SystemSnapshot,
};

// =============================================================================
// Snapshot Builder
// =============================================================================

/// Builder for [`SystemSnapshot`] instances.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    timestamp: DateTime<Utc>,
    cpu_usage: f64,
    memory_usage: f64,
    disk: bool,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// Create a builder timestamped "now" with no disk reading.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            cpu_usage: 25.0,
            memory_usage: 50.0,
            disk: false,
        }
    }

    /// Set the sample timestamp for every reading.
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }

    /// Set the overall CPU usage percentage.
    pub fn cpu_usage(mut self, percent: f64) -> Self {
        self.cpu_usage = percent;
        self
    }

    /// Set the memory usage percentage.
    pub fn memory_usage(mut self, percent: f64) -> Self {
        self.memory_usage = percent;
        self
    }

    /// Include a disk reading in the snapshot.
    pub fn with_disk(mut self) -> Self {
        self.disk = true;
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> SystemSnapshot {
        SystemSnapshot {
            cpu: CpuSample {
                timestamp: self.timestamp,
                usage_percent: self.cpu_usage,
                load_1m: 1.2,
                load_5m: 0.9,
                load_15m: 0.7,
                cores: vec![
                    CoreUsage {
                        core: "cpu0".to_string(),
                        usage_percent: self.cpu_usage,
                    },
                    CoreUsage {
                        core: "cpu1".to_string(),
                        usage_percent: self.cpu_usage / 2.0,
                    },
                ],
            },
            memory: MemorySample {
                timestamp: self.timestamp,
                usage_percent: self.memory_usage,
                used_bytes: 8 * 1024 * 1024 * 1024,
                total_bytes: 16 * 1024 * 1024 * 1024,
                free_bytes: 8 * 1024 * 1024 * 1024,
            },
            disk: self.disk.then(|| disk_sample_at(self.timestamp)),
        }
    }
}

// =============================================================================
// Sample Helpers
// =============================================================================

/// A CPU sample at the given instant.
pub fn cpu_sample_at(ts: DateTime<Utc>) -> MetricSample {
    MetricSample::Cpu(CpuSample {
        timestamp: ts,
        usage_percent: 30.0,
        load_1m: 0.8,
        load_5m: 0.6,
        load_15m: 0.5,
        cores: Vec::new(),
    })
}

/// A memory sample at the given instant.
pub fn memory_sample_at(ts: DateTime<Utc>) -> MetricSample {
    MetricSample::Memory(MemorySample {
        timestamp: ts,
        usage_percent: 55.0,
        used_bytes: 9 * 1024 * 1024 * 1024,
        total_bytes: 16 * 1024 * 1024 * 1024,
        free_bytes: 7 * 1024 * 1024 * 1024,
    })
}

/// A disk reading at the given instant, with one partition.
pub fn disk_sample_at(ts: DateTime<Utc>) -> DiskSample {
    DiskSample {
        timestamp: ts,
        usage_percent: 64.0,
        used_bytes: 320 * 1024 * 1024 * 1024,
        total_bytes: 500 * 1024 * 1024 * 1024,
        available_bytes: 180 * 1024 * 1024 * 1024,
        partitions: vec![PartitionUsage {
            filesystem: "/dev/sda1".to_string(),
            mountpoint: "/".to_string(),
            usage_percent: 64.0,
            used_bytes: 320 * 1024 * 1024 * 1024,
            total_bytes: 500 * 1024 * 1024 * 1024,
        }],
    }
}

/// A disk sample at the given instant.
pub fn disk_metric_at(ts: DateTime<Utc>) -> MetricSample {
    MetricSample::Disk(disk_sample_at(ts))
}
