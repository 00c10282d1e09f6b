//! Error types for SampleSync Core
//!
//! Provides the error taxonomy for:
//! - Unknown sample/kit/order/appointment ids
//! - Hard invariant violations
//! - Collaborator (transport) failures and timeouts
//! - Cascade resolution failures
//! - Configuration loading

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main synchronization error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Unknown id
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Which resource was looked up
        resource: ResourceKind,
        /// The id that was not found
        id: String,
    },

    /// Attempted update violates a hard invariant
    #[error("validation failed: {0}")]
    Validation(String),

    /// The underlying collaborator call failed
    #[error("transport error: {0}")]
    Transport(String),

    /// A collaborator call did not answer in time
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// Collaborator operation that stalled
        operation: &'static str,
        /// Configured per-call limit
        timeout_ms: u64,
    },

    /// Samples for an order could not be enumerated at all
    #[error("could not resolve samples for order {order_id}: {reason}")]
    ResolutionFailure {
        /// Order being resolved
        order_id: String,
        /// Underlying cause
        reason: String,
    },

    /// The appointment commit was rejected
    #[error("appointment commit failed: {0}")]
    CommitFailed(String),
}

impl SyncError {
    /// Not-found error for a resource id
    #[inline]
    pub fn not_found(resource: ResourceKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Transport error from any displayable cause
    #[inline]
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Classification used in batch error slots
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ResolutionFailure { .. } => ErrorKind::ResolutionFailure,
            Self::CommitFailed(_) => ErrorKind::CommitFailed,
        }
    }

    /// Check if the caller may reasonably retry
    ///
    /// Nothing is retried internally; retry policy belongs to the caller.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

/// Resource addressed by a failing lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Lab sample
    Sample,
    /// Collection kit
    SampleKit,
    /// Customer order
    Order,
    /// Scheduled appointment
    Appointment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sample => "sample",
            Self::SampleKit => "sample kit",
            Self::Order => "order",
            Self::Appointment => "appointment",
        };
        f.write_str(name)
    }
}

/// Error classification carried in serialized batch results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown id
    NotFound,
    /// Hard invariant violation
    Validation,
    /// Collaborator failure
    Transport,
    /// Collaborator timeout
    Timeout,
    /// Cascade could not enumerate samples
    ResolutionFailure,
    /// Appointment commit rejected
    CommitFailed,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for `SyncConfig`
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
