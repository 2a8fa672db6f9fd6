// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for pulse.
//!
//! This module defines the error types shared across the engine:
//!
//! - Clear, descriptive error messages
//! - Error chaining for traceability
//! - Distinguishes between retryable and non-retryable errors
//! - Supports structured logging via `error_type()`
//!
//! # Error Hierarchy
//!
//! ```text
//! EngineError (root)
//! ├── SettingsError  - Settings store lookups
//! └── StoreError     - Durable log storage operations
//! ```

use thiserror::Error;

// =============================================================================
// EngineError - Root Error Type
// =============================================================================

/// The root error type for the pulse metrics engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Settings store error.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Storage backend error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Settings(e) => e.is_retryable(),
            EngineError::Store(e) => e.is_retryable(),
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            EngineError::Settings(_) => "settings",
            EngineError::Store(_) => "store",
        }
    }
}

// =============================================================================
// SettingsError
// =============================================================================

/// Settings store errors.
///
/// A missing key is never an error — typed accessors return the hardcoded
/// default instead. These variants cover a genuinely unreachable backend or
/// an unusable stored value; callers in the flush and sweep paths fall back
/// to defaults rather than failing the operation.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings backend could not be reached.
    #[error("Settings backend unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value could not be coerced to the expected type.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// The settings key.
        key: String,
        /// Error message.
        message: String,
    },
}

impl SettingsError {
    /// Creates an unavailable-backend error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unavailable-backend error with a source.
    pub fn unavailable_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid-value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettingsError::Unavailable { .. })
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            SettingsError::Unavailable { .. } => "unavailable",
            SettingsError::InvalidValue { .. } => "invalid_value",
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Durable log storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A bulk insert failed. The drained batch is lost by design.
    #[error("Bulk insert failed: {message}")]
    InsertFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A range delete failed.
    #[error("Range delete failed: {message}")]
    DeleteFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A read query failed.
    #[error("Query failed: {message}")]
    QueryFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A persisted row could not be decoded.
    #[error("Corrupted row {id}: {message}")]
    CorruptedRow {
        /// The row identifier.
        id: i64,
        /// Error message.
        message: String,
    },

    /// The database itself failed (connection, schema, transaction).
    #[error("Database error: {message}")]
    Database {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates an insert failed error.
    pub fn insert_failed(message: impl Into<String>) -> Self {
        Self::InsertFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an insert failed error with a source.
    pub fn insert_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InsertFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a delete failed error.
    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::DeleteFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a delete failed error with a source.
    pub fn delete_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DeleteFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a query failed error.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a query failed error with a source.
    pub fn query_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::QueryFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a corrupted row error.
    pub fn corrupted_row(id: i64, message: impl Into<String>) -> Self {
        Self::CorruptedRow {
            id,
            message: message.into(),
        }
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a database error with a source.
    pub fn database_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::InsertFailed { .. }
                | StoreError::DeleteFailed { .. }
                | StoreError::QueryFailed { .. }
                | StoreError::Database { .. }
        )
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            StoreError::InsertFailed { .. } => "insert_failed",
            StoreError::DeleteFailed { .. } => "delete_failed",
            StoreError::QueryFailed { .. } => "query_failed",
            StoreError::CorruptedRow { .. } => "corrupted_row",
            StoreError::Database { .. } => "database",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// A Result type with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

/// A Result type with SettingsError.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A Result type with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Tests
// =============================================================================
