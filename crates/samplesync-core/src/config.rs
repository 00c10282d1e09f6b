//! Engine configuration
//!
//! Bounds for the cascade fan-out and per-call timeouts. Loadable from TOML:
//!
//! ```toml
//! max_concurrency = 8
//! call_timeout_ms = 10000
//! note_context_prefix = "auto-updated from appointment status"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_MAX_CONCURRENCY: usize = 8;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// SampleSync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum in-flight collaborator calls per fan-out
    pub max_concurrency: usize,
    /// Per-call timeout in milliseconds
    pub call_timeout_ms: u64,
    /// Prefix of the note written on cascaded sample updates
    pub note_context_prefix: String,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max concurrency
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With note prefix
    #[inline]
    #[must_use]
    pub fn with_note_context_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.note_context_prefix = prefix.into();
        self
    }

    /// Per-call timeout; zero falls back to the default
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        match self.call_timeout_ms {
            0 => Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::InvalidValue` if a bound is zero
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Fails if the file cannot be read or does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject zero bounds
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "call_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            note_context_prefix: "auto-updated from appointment status".to_string(),
        }
    }
}
