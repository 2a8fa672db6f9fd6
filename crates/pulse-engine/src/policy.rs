// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-kind flush and retention policy, read from the settings store.
//!
//! Every accessor here reads the backing store fresh — nothing is cached.
//! That costs a settings round trip per decision, which is acceptable at
//! the seconds-to-hours cadence these timers run at, and it is what lets
//! runtime configuration changes take effect on the next cycle without a
//! restart.
//!
//! A value that is missing, unparseable, or out of range falls back to the
//! hardcoded default for that kind; a settings-store outage does the same.
//! Policy reads can never fail a flush or a sweep.

use std::time::Duration;

use pulse_core::types::MetricKind;
use pulse_store::settings::{bool_or, value_or, SettingsStore};

// =============================================================================
// Settings Keys
// =============================================================================

/// Key for the size threshold that triggers an immediate flush.
pub fn batch_size_key(kind: MetricKind) -> String {
    format!("METRICS_LOG_BATCH_SIZE_{}", kind.settings_suffix())
}

/// Key for the timer-driven flush interval in milliseconds.
pub fn batch_interval_key(kind: MetricKind) -> String {
    format!("METRICS_LOG_BATCH_INTERVAL_MS_{}", kind.settings_suffix())
}

/// Key for the retention window in days.
pub fn retention_days_key(kind: MetricKind) -> String {
    format!("METRICS_LOG_RETENTION_DAYS_{}", kind.settings_suffix())
}

/// Key for the per-kind cleanup enable flag.
pub fn cleanup_enabled_key(kind: MetricKind) -> String {
    format!("METRICS_CLEANUP_ENABLED_{}", kind.settings_suffix())
}

/// Key for the cleanup interval in hours.
pub fn cleanup_interval_key(kind: MetricKind) -> String {
    format!("METRICS_CLEANUP_INTERVAL_HOURS_{}", kind.settings_suffix())
}

// =============================================================================
// Defaults
// =============================================================================

/// The full policy for one metric kind.
///
/// Disk defaults differ from CPU/memory: disk usage barely moves between
/// samples, so it flushes one sample per hour and keeps a longer history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Queue length that triggers an immediate flush (>= 1).
    pub batch_size: u32,
    /// Delay between timer-driven flushes.
    pub batch_interval: Duration,
    /// Age past which persisted rows are swept.
    pub retention_days: u32,
    /// Whether scheduled sweeps run for this kind.
    pub cleanup_enabled: bool,
    /// Delay between scheduled sweeps.
    pub cleanup_interval: Duration,
}

impl FlushPolicy {
    /// The hardcoded defaults for `kind`.
    pub fn defaults(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Cpu | MetricKind::Memory => Self {
                batch_size: 10,
                batch_interval: Duration::from_millis(30_000),
                retention_days: 7,
                cleanup_enabled: true,
                cleanup_interval: Duration::from_secs(24 * 3600),
            },
            MetricKind::Disk => Self {
                batch_size: 1,
                batch_interval: Duration::from_millis(3_600_000),
                retention_days: 30,
                cleanup_enabled: true,
                cleanup_interval: Duration::from_secs(24 * 3600),
            },
        }
    }
}

// =============================================================================
// Fresh Accessors
// =============================================================================

/// Current batch-size threshold for `kind` (>= 1).
pub async fn batch_size(settings: &dyn SettingsStore, kind: MetricKind) -> u32 {
    let default = FlushPolicy::defaults(kind).batch_size;
    let value: u32 = value_or(settings, &batch_size_key(kind), default).await;
    if value == 0 { default } else { value }
}

/// Current timer-flush interval for `kind` (> 0).
pub async fn batch_interval(settings: &dyn SettingsStore, kind: MetricKind) -> Duration {
    let default = FlushPolicy::defaults(kind).batch_interval;
    let ms: u64 = value_or(settings, &batch_interval_key(kind), default.as_millis() as u64).await;
    if ms == 0 { default } else { Duration::from_millis(ms) }
}

/// Current retention window for `kind` in days (>= 0; zero sweeps
/// everything older than now).
pub async fn retention_days(settings: &dyn SettingsStore, kind: MetricKind) -> u32 {
    let default = FlushPolicy::defaults(kind).retention_days;
    value_or(settings, &retention_days_key(kind), default).await
}

/// Whether scheduled sweeps are currently enabled for `kind`.
pub async fn cleanup_enabled(settings: &dyn SettingsStore, kind: MetricKind) -> bool {
    let default = FlushPolicy::defaults(kind).cleanup_enabled;
    bool_or(settings, &cleanup_enabled_key(kind), default).await
}

/// Current sweep interval for `kind` (> 0).
pub async fn cleanup_interval(settings: &dyn SettingsStore, kind: MetricKind) -> Duration {
    let default = FlushPolicy::defaults(kind).cleanup_interval;
    let hours: u64 =
        value_or(settings, &cleanup_interval_key(kind), default.as_secs() / 3600).await;
    if hours == 0 {
        default
    } else {
        Duration::from_secs(hours.saturating_mul(3600))
    }
}

// =============================================================================
// Tests
// =============================================================================
