//! Error types for trust store operations.

use thiserror::Error;
use warden_kv_types::BackendError;

use crate::types::CertAuthId;

/// Errors returned by the trust store.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The input failed a structural check; nothing was written.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The slot the operation expects is absent.
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// Create collided with existing active records.
    #[error("one or more CAs from cluster(s) {} already exist", format_ids(ids))]
    AlreadyExists { ids: Vec<CertAuthId> },

    /// A fenced or atomic write lost a race.
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// A record could not be encoded or decoded.
    #[error("serialization failed: {reason}")]
    Serialization { reason: String },

    /// Backend failure, wrapped with the failing operation and what it targeted.
    #[error("{operation} of {target} failed: {source}")]
    Backend {
        operation: String,
        target: String,
        #[source]
        source: BackendError,
    },
}

/// Structural discriminant callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retrying the same input fails again.
    ///
    /// Covers [`TrustError::Serialization`] too, including a stored record
    /// that no longer decodes on a single-item read.
    Validation,
    NotFound,
    AlreadyExists,
    /// Re-read and retry.
    Conflict,
    /// Transport-level retry with backoff.
    Unavailable,
}

impl TrustError {
    pub fn backend(operation: impl Into<String>, target: impl ToString, source: BackendError) -> Self {
        TrustError::Backend {
            operation: operation.into(),
            target: target.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrustError::Validation { .. } => ErrorKind::Validation,
            TrustError::NotFound { .. } => ErrorKind::NotFound,
            TrustError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            TrustError::Conflict { .. } => ErrorKind::Conflict,
            TrustError::Serialization { .. } => ErrorKind::Validation,
            TrustError::Backend { source, .. } => backend_kind(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

fn backend_kind(err: &BackendError) -> ErrorKind {
    match err {
        BackendError::NotFound { .. } => ErrorKind::NotFound,
        BackendError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
        BackendError::CompareFailed { .. } | BackendError::ConditionFailed { .. } => ErrorKind::Conflict,
        e if e.is_invalid_request() => ErrorKind::Validation,
        _ => ErrorKind::Unavailable,
    }
}

fn format_ids(ids: &[CertAuthId]) -> String {
    let mut names: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids {
        if !names.contains(&id.domain_name.as_str()) {
            names.push(&id.domain_name);
        }
    }
    format!("{:?}", names.join(","))
}

/// Result alias for trust store operations.
pub type Result<T, E = TrustError> = std::result::Result<T, E>;
