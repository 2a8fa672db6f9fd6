// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for the pulse metrics engine.
//!
//! This module defines the metric sample shapes produced by the external
//! sampler and consumed by the batching engine. Sample timestamps are always
//! supplied by the sampler — the engine never stamps arrival time as sample
//! time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Metric Kind
// =============================================================================

/// The three metric classes tracked by the engine.
///
/// Each kind owns an independent queue, flush schedule, and retention
/// policy. There is no shared state across kinds.
///
/// # Examples
///
/// ```
/// use pulse_core::types::MetricKind;
///
/// assert_eq!(MetricKind::Cpu.settings_suffix(), "CPU");
/// assert_eq!(MetricKind::ALL.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// CPU usage and load averages.
    Cpu,
    /// Memory usage.
    Memory,
    /// Disk usage, including per-partition breakdown.
    Disk,
}

impl MetricKind {
    /// All metric kinds, in decomposition order.
    pub const ALL: [MetricKind; 3] = [MetricKind::Cpu, MetricKind::Memory, MetricKind::Disk];

    /// Returns the lowercase name used in storage and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
        }
    }

    /// Returns the uppercase suffix used in settings keys
    /// (e.g. `METRICS_LOG_BATCH_SIZE_CPU`).
    pub fn settings_suffix(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "CPU",
            MetricKind::Memory => "MEMORY",
            MetricKind::Disk => "DISK",
        }
    }

    /// Parses a kind from its lowercase storage name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cpu" => Some(MetricKind::Cpu),
            "memory" => Some(MetricKind::Memory),
            "disk" => Some(MetricKind::Disk),
            _ => None,
        }
    }

    /// Returns a stable array index for per-kind storage.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            MetricKind::Cpu => 0,
            MetricKind::Memory => 1,
            MetricKind::Disk => 2,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Samples
// =============================================================================

/// Usage of a single CPU core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreUsage {
    /// Core identifier (e.g. `cpu0`).
    pub core: String,
    /// Usage percentage (0-100).
    pub usage_percent: f64,
}

/// One CPU reading at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    /// Sampler-supplied wall-clock timestamp.
    pub timestamp: DateTime<Utc>,
    /// Overall usage percentage (0-100).
    pub usage_percent: f64,
    /// 1-minute load average (non-negative).
    pub load_1m: f64,
    /// 5-minute load average (non-negative).
    pub load_5m: f64,
    /// 15-minute load average (non-negative).
    pub load_15m: f64,
    /// Per-core usage, in core order.
    pub cores: Vec<CoreUsage>,
}

/// One memory reading at one instant.
///
/// `used + free` need not exactly equal `total` due to OS accounting, but
/// `used <= total` is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Sampler-supplied wall-clock timestamp.
    pub timestamp: DateTime<Utc>,
    /// Usage percentage (0-100).
    pub usage_percent: f64,
    /// Used memory in bytes.
    pub used_bytes: u64,
    /// Total memory in bytes.
    pub total_bytes: u64,
    /// Free memory in bytes.
    pub free_bytes: u64,
}

/// Usage of a single disk partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionUsage {
    /// Filesystem label (e.g. `/dev/sda1`).
    pub filesystem: String,
    /// Mount point (e.g. `/var`).
    pub mountpoint: String,
    /// Usage percentage (0-100).
    pub usage_percent: f64,
    /// Used bytes on this partition.
    pub used_bytes: u64,
    /// Total bytes on this partition.
    pub total_bytes: u64,
}

/// One disk reading at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    /// Sampler-supplied wall-clock timestamp.
    pub timestamp: DateTime<Utc>,
    /// Aggregate usage percentage (0-100).
    pub usage_percent: f64,
    /// Used bytes across all partitions.
    pub used_bytes: u64,
    /// Total bytes across all partitions.
    pub total_bytes: u64,
    /// Available bytes across all partitions.
    pub available_bytes: u64,
    /// Per-partition breakdown, in mount order.
    pub partitions: Vec<PartitionUsage>,
}

/// A sample of exactly one metric kind.
///
/// This is the unit the queues and the storage backend deal in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricSample {
    /// A CPU sample.
    Cpu(CpuSample),
    /// A memory sample.
    Memory(MemorySample),
    /// A disk sample.
    Disk(DiskSample),
}

impl MetricSample {
    /// Returns the kind of this sample.
    #[inline]
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricSample::Cpu(_) => MetricKind::Cpu,
            MetricSample::Memory(_) => MetricKind::Memory,
            MetricSample::Disk(_) => MetricKind::Disk,
        }
    }

    /// Returns the sampler-supplied timestamp.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MetricSample::Cpu(s) => s.timestamp,
            MetricSample::Memory(s) => s.timestamp,
            MetricSample::Disk(s) => s.timestamp,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// One complete multi-metric reading produced by the external sampler.
///
/// Disk metrics may be absent (some containerized environments report none);
/// in that case no disk sample is queued and no error is raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// CPU reading.
    pub cpu: CpuSample,
    /// Memory reading.
    pub memory: MemorySample,
    /// Disk reading, if the sampler produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskSample>,
}

impl SystemSnapshot {
    /// Decomposes the snapshot into its typed samples, in kind order.
    ///
    /// Yields two or three samples depending on whether disk metrics are
    /// present.
    pub fn into_samples(self) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(3);
        samples.push(MetricSample::Cpu(self.cpu));
        samples.push(MetricSample::Memory(self.memory));
        if let Some(disk) = self.disk {
            samples.push(MetricSample::Disk(disk));
        }
        samples
    }
}

// =============================================================================
// Persisted Log Row
// =============================================================================

/// A persisted metric sample.
///
/// Rows are created only by a flush's bulk insert, destroyed only by a
/// retention sweep, and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    /// Storage-generated unique identifier.
    pub id: i64,
    /// The metric kind of the sample.
    pub kind: MetricKind,
    /// The sample itself.
    pub sample: MetricSample,
    /// Storage-assigned creation time (distinct from the sample timestamp).
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_sample(ts: DateTime<Utc>) -> CpuSample {
        CpuSample {
            timestamp: ts,
            usage_percent: 12.5,
            load_1m: 0.4,
            load_5m: 0.3,
            load_15m: 0.2,
            cores: vec![CoreUsage { core: "cpu0".into(), usage_percent: 12.5 }],
        }
    }

    fn memory_sample(ts: DateTime<Utc>) -> MemorySample {
        MemorySample {
            timestamp: ts,
            usage_percent: 40.0,
            used_bytes: 4 << 30,
            total_bytes: 10 << 30,
            free_bytes: 6 << 30,
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MetricKind::parse("network"), None);
    }

    #[test]
    fn test_kind_settings_suffix() {
        assert_eq!(MetricKind::Cpu.settings_suffix(), "CPU");
        assert_eq!(MetricKind::Memory.settings_suffix(), "MEMORY");
        assert_eq!(MetricKind::Disk.settings_suffix(), "DISK");
    }

    #[test]
    fn test_kind_index_is_stable() {
        for (i, kind) in MetricKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_snapshot_decomposition_with_disk() {
        let ts = Utc::now();
        let snapshot = SystemSnapshot {
            cpu: cpu_sample(ts),
            memory: memory_sample(ts),
            disk: Some(DiskSample {
                timestamp: ts,
                usage_percent: 55.0,
                used_bytes: 55 << 30,
                total_bytes: 100 << 30,
                available_bytes: 45 << 30,
                partitions: vec![],
            }),
        };

        let samples = snapshot.into_samples();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].kind(), MetricKind::Cpu);
        assert_eq!(samples[1].kind(), MetricKind::Memory);
        assert_eq!(samples[2].kind(), MetricKind::Disk);
    }

    #[test]
    fn test_snapshot_decomposition_without_disk() {
        let ts = Utc::now();
        let snapshot = SystemSnapshot {
            cpu: cpu_sample(ts),
            memory: memory_sample(ts),
            disk: None,
        };

        let samples = snapshot.into_samples();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.kind() != MetricKind::Disk));
    }

    #[test]
    fn test_sample_preserves_sampler_timestamp() {
        let ts = Utc::now() - chrono::Duration::seconds(90);
        let sample = MetricSample::Memory(memory_sample(ts));
        assert_eq!(sample.timestamp(), ts);
    }

    #[test]
    fn test_sample_serde_roundtrip() {
        let sample = MetricSample::Cpu(cpu_sample(Utc::now()));
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"kind\":\"cpu\""));

        let back: MetricSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
