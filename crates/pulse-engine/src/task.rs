// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Cancellable periodic tasks.
//!
//! The engine runs six recurring timers (three flush, three sweep). Each is
//! a self-rescheduling loop whose delay is recomputed before every sleep,
//! so a configuration change applies on the next cycle. `TaskHandle` is the
//! explicit cancellation handle; `shutdown` is race-free against an
//! in-flight callback: a callback that has already started runs to
//! completion, a cancel that lands during the sleep aborts the sleep
//! without running the callback, and `shutdown` returns only after the
//! loop has exited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// =============================================================================
// Periodic Job
// =============================================================================

/// A unit of work scheduled on its own recurring timer.
#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    /// Task name for logging.
    fn name(&self) -> &str;

    /// Delay before the next run, recomputed before every sleep.
    async fn delay(&self) -> Duration;

    /// One timer callback. Must not panic; errors are handled internally.
    async fn run(&self);
}

// =============================================================================
// Task Handle
// =============================================================================

/// Handle to a running periodic task.
///
/// Dropping the handle does NOT stop the task; call [`TaskHandle::shutdown`].
#[derive(Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Cancels the task and waits for its loop to exit.
    ///
    /// If a callback is mid-run it completes first; no further callback
    /// starts afterward.
    pub async fn shutdown(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Stores a permit if the loop is not currently waiting, so the
        // cancel is never missed between sleep cycles.
        self.notify.notify_one();

        if let Err(e) = self.handle.await {
            warn!(error = %e, "Periodic task panicked before shutdown");
        }
    }

    /// Returns `true` if the task's loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns `job` on a recurring timer and returns its handle.
///
/// The first callback runs after the first delay elapses, not immediately.
pub fn spawn_periodic(job: Arc<dyn PeriodicJob>) -> TaskHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let notify = Arc::new(Notify::new());

    let handle = {
        let cancelled = cancelled.clone();
        let notify = notify.clone();

        tokio::spawn(async move {
            debug!(task = job.name(), "Periodic task started");

            loop {
                let delay = job.delay().await;

                tokio::select! {
                    _ = notify.notified() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                if cancelled.load(Ordering::SeqCst) {
                    break;
                }

                job.run().await;
            }

            debug!(task = job.name(), "Periodic task stopped");
        })
    };

    TaskHandle { cancelled, notify, handle }
}

// =============================================================================
// Tests
// =============================================================================
