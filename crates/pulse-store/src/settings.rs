// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings store seam.
//!
//! The settings store belongs to the surrounding application (the panel's
//! key-value settings table); the engine only reads from it. The contract
//! here is deliberately tolerant: a missing key is never an error, and a
//! failing backend must not take metrics collection down with it — callers
//! fall back to hardcoded defaults instead.

use async_trait::async_trait;
use std::str::FromStr;
use tracing::warn;

use pulse_core::error::{SettingsResult, SettingsError};

// =============================================================================
// Settings Store Trait
// =============================================================================

/// Typed key-value configuration lookups with fallback defaults.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the raw stored value for `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Only for a genuinely unreachable backend. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> SettingsResult<Option<String>>;

    /// Stores a raw value for `key`.
    async fn set(&self, key: &str, value: &str) -> SettingsResult<()>;
}

// =============================================================================
// Typed Read Helper
// =============================================================================

/// Reads a typed value from the store, falling back to `default`.
///
/// Fallback cases, none of which propagate an error:
///
/// - key absent: `default`, no side effects
/// - stored value does not parse as `T`: `default`, logged
/// - backend unreachable: `default`, logged — metrics collection must
///   survive settings-store outages
pub async fn value_or<T>(store: &dyn SettingsStore, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match store.get(key).await {
        Ok(Some(raw)) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                let err = SettingsError::invalid_value(key, format!("unparseable '{}'", raw));
                warn!(key, error = %err, "Falling back to default for settings key");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Settings backend unreachable, using default");
            default
        }
    }
}

/// Reads a boolean, accepting the spellings the panel historically stored.
///
/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` (case-insensitive); anything
/// else falls back to `default`.
pub async fn bool_or(store: &dyn SettingsStore, key: &str, default: bool) -> bool {
    match store.get(key).await {
        Ok(Some(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                warn!(key, value = other, "Unrecognized boolean setting, using default");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Settings backend unreachable, using default");
            default
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
