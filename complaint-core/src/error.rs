//! Error types for complaint store operations

use crate::{ComplaintId, ResolutionState};
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Validation errors raised by value-type constructors and record checks.
///
/// These never reach the cache or the store: every write path validates
/// before touching either.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Value for {field} is too long: {actual} characters (max {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Invalid complaint id '{value}': {reason}")]
    InvalidComplaintId { value: String, reason: String },

    #[error("Illegal resolution transition: {from} -> {to}")]
    InvalidTransition {
        from: ResolutionState,
        to: ResolutionState,
    },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Complaint not found: {id}")]
    NotFound { id: ComplaintId },

    #[error("Corrupted record at {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("I/O failure on {} ({kind:?}): {reason}", path.display())]
    Io {
        path: PathBuf,
        kind: ErrorKind,
        reason: String,
    },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: &'static str },

    #[error("Deadline exceeded before {operation}")]
    DeadlineExceeded { operation: &'static str },
}

impl StorageError {
    /// Build an `Io` error from a `std::io::Error` raised while touching `path`.
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    /// Whether the error came from the cancellation context rather than the store.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            StorageError::Cancelled { .. } | StorageError::DeadlineExceeded { .. }
        )
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all complaint store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComplaintError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ComplaintError {
    /// True for `StorageError::NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ComplaintError::Storage(StorageError::NotFound { .. }))
    }

    /// True for `StorageError::Corrupted`.
    pub fn is_corrupted(&self) -> bool {
        matches!(self, ComplaintError::Storage(StorageError::Corrupted { .. }))
    }
}

/// Result type alias for complaint store operations.
pub type ComplaintResult<T> = Result<T, ComplaintError>;

// =============================================================================
// TESTS
// =============================================================================
