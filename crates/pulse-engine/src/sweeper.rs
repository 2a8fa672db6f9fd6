// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-kind retention sweeper.
//!
//! Each sweep computes a cutoff from the kind's retention window, read
//! fresh from settings, and deletes every persisted sample strictly older
//! than the cutoff. The timer chain swallows sweep errors so a transient
//! storage failure never kills the recurring cleanup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use pulse_core::error::StoreResult;
use pulse_core::types::MetricKind;
use pulse_store::settings::SettingsStore;
use pulse_store::traits::LogStore;

use crate::policy;
use crate::task::PeriodicJob;

// =============================================================================
// Retention Sweeper
// =============================================================================

/// Deletes one kind's samples that have aged out of the retention window.
pub struct RetentionSweeper {
    kind: MetricKind,
    name: String,
    store: Arc<dyn LogStore>,
    settings: Arc<dyn SettingsStore>,
}

impl RetentionSweeper {
    /// Creates a sweeper for `kind` over the given backends.
    pub fn new(
        kind: MetricKind,
        store: Arc<dyn LogStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            kind,
            name: format!("sweep-{}", kind),
            store,
            settings,
        }
    }

    /// The metric kind this sweeper serves.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Runs one sweep and returns the number of rows deleted.
    ///
    /// The retention window is read fresh on every call; a window of zero
    /// days means "delete everything older than now".
    pub async fn sweep(&self) -> StoreResult<u64> {
        let days = policy::retention_days(&*self.settings, self.kind).await;
        // A stored window can exceed the representable date range; such a
        // cutoff is "before everything", never a panic in the timer chain.
        let cutoff = Utc::now()
            .checked_sub_signed(chrono::Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let deleted = self.store.delete_older_than(self.kind, cutoff).await?;
        if deleted > 0 {
            info!(
                kind = %self.kind,
                deleted,
                retention_days = days,
                "Deleted expired metric logs"
            );
        }
        Ok(deleted)
    }
}

#[async_trait]
impl PeriodicJob for RetentionSweeper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn delay(&self) -> Duration {
        policy::cleanup_interval(&*self.settings, self.kind).await
    }

    async fn run(&self) {
        if !policy::cleanup_enabled(&*self.settings, self.kind).await {
            debug!(kind = %self.kind, "Cleanup disabled; skipping sweep");
            return;
        }
        if let Err(e) = self.sweep().await {
            error!(kind = %self.kind, error = %e, "Retention sweep failed");
        }
    }
}

impl std::fmt::Debug for RetentionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionSweeper")
            .field("kind", &self.kind)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
