//! Error types for the gateway.

use meridian_config::ConfigError;
use meridian_core::{LifecycleError, StoreError};
use meridian_discovery::DiscoveryError;
use meridian_docs::MergeError;
use meridian_telemetry::TelemetryError;
use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Route discovery failed.
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Document merging failed.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// A route store or registry call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Start-up or shutdown failed.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Logging or metrics could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Invalid command line.
    #[error("Usage error: {message}")]
    Usage {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Discovery(e) => e.is_recoverable(),
            Self::Merge(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Get the error category for metrics and logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Discovery(e) => e.category(),
            Self::Merge(e) => e.category(),
            Self::Store(_) => "store",
            Self::Lifecycle(_) => "lifecycle",
            Self::Telemetry(_) => "telemetry",
            Self::Usage { .. } => "usage",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_delegates() {
        let err: GatewayError = DiscoveryError::http_status("http://users/openapi.json", 503).into();
        assert_eq!(err.category(), "http_status");

        let err: GatewayError = MergeError::EmptyInput.into();
        assert_eq!(err.category(), MergeError::EmptyInput.category());
    }

    #[test]
    fn test_recoverable() {
        let err: GatewayError = StoreError::unavailable("connection refused").into();
        assert!(err.is_recoverable());
        assert!(!GatewayError::usage("unknown command").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = GatewayError::usage("unknown command: serve");
        assert_eq!(err.to_string(), "Usage error: unknown command: serve");

        let err: GatewayError = ConfigError::missing_field("gateway.name").into();
        assert!(err.to_string().contains("gateway.name"));
    }
}
