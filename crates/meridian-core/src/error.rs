//! Error types for Meridian core collaborators.
//!
//! [`StoreError`] is returned by route stores and service registries,
//! [`LifecycleError`] by service start-up and shutdown sequences.

use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias using [`LifecycleError`].
pub type LifecycleResult<T = ()> = Result<T, LifecycleError>;

/// Errors raised by route stores and service registries.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Human-readable error message.
        message: String,
    },

    /// The store has not been initialized yet.
    #[error("store not initialized")]
    NotInitialized,

    /// A stored record could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key did not match the expected format.
    #[error("invalid store key '{key}': {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why the key was rejected.
        reason: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying the call later might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Errors raised while starting or stopping a service.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Service start-up failed.
    #[error("startup failed: {0}")]
    StartupFailed(String),

    /// One or more shutdown hooks failed. All hooks were still run.
    #[error("shutdown failed: {}", .failures.join("; "))]
    ShutdownFailed {
        /// One `"<hook>: <error>"` entry per failed hook, in run order.
        failures: Vec<String>,
    },

    /// A single hook failed.
    #[error("lifecycle hook error: {message}")]
    HookError {
        /// Error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A registry call made during the lifecycle failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// Creates a new hook error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::HookError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new hook error with a source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HookError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::unavailable("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert!(err.is_recoverable());

        let err = StoreError::invalid_key("routes:GET", "missing path");
        assert!(err.to_string().contains("routes:GET"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_shutdown_failed_lists_every_hook() {
        let err = LifecycleError::ShutdownFailed {
            failures: vec!["flush: disk full".to_string(), "close: timeout".to_string()],
        };
        assert_eq!(err.to_string(), "shutdown failed: flush: disk full; close: timeout");
    }

    #[test]
    fn test_hook_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = LifecycleError::with_source("drain failed", io);
        assert!(err.to_string().contains("drain failed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
