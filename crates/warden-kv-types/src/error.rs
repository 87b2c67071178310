//! Backend error type.

use thiserror::Error;

/// Errors returned by a backend implementation.
///
/// Condition failures are reported as distinct variants so callers can tell an
/// optimistic-concurrency loss apart from an unavailable backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("key '{key}' not found")]
    NotFound { key: String },
    #[error("key '{key}' already exists")]
    AlreadyExists { key: String },
    /// A single-key compare-and-swap or revision-fenced update lost the race.
    #[error("compare failed for key '{key}'")]
    CompareFailed { key: String },
    /// A condition in an atomic write did not hold; nothing was applied.
    #[error("condition of action {index} in atomic write not met")]
    ConditionFailed { index: u32 },
    #[error("key cannot be empty")]
    EmptyKey,
    #[error("key size {size} exceeds maximum of {max} bytes")]
    KeyTooLarge { size: u32, max: u32 },
    #[error("value size {size} exceeds maximum of {max} bytes")]
    ValueTooLarge { size: u32, max: u32 },
    #[error("atomic write of {size} actions exceeds maximum of {max}")]
    BatchTooLarge { size: u32, max: u32 },
    #[error("atomic write must contain at least one action")]
    EmptyBatch,
    #[error("key '{key}' appears more than once in atomic write")]
    DuplicateKey { key: String },
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl BackendError {
    /// Whether the error reports a failed precondition rather than a fault.
    pub fn is_condition_failure(&self) -> bool {
        matches!(self, BackendError::CompareFailed { .. } | BackendError::ConditionFailed { .. })
    }

    /// Whether the request itself was malformed.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            BackendError::EmptyKey
                | BackendError::KeyTooLarge { .. }
                | BackendError::ValueTooLarge { .. }
                | BackendError::BatchTooLarge { .. }
                | BackendError::EmptyBatch
                | BackendError::DuplicateKey { .. }
                | BackendError::InvalidArgument { .. }
        )
    }
}
