//! Route discovery error types.

use std::fmt;
use std::time::Duration;

use meridian_core::StoreError;
use thiserror::Error;

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors raised while fetching API documents or discovering routes.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Error message.
        message: String,
    },

    /// The request failed in transport or timed out.
    #[error("network error fetching {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("{url} returned HTTP status {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The body was not a usable API document.
    #[error("failed to decode API document from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The document's `paths` could not be walked.
    #[error("failed to extract routes: {message}")]
    Extraction {
        /// Error message.
        message: String,
    },

    /// Persisting a route failed.
    #[error("route store error: {0}")]
    Store(#[from] StoreError),

    /// One or more services failed during a discovery pass.
    #[error("route discovery failed for {} of {total} service(s): {}", .failures.len(), join_failures(.failures))]
    Batch {
        /// Number of services in the pass.
        total: usize,
        /// Per-service failures, in discovery order.
        failures: Vec<ServiceFailure>,
    },
}

/// A single service's discovery failure within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    /// Service name.
    pub service: String,
    /// Error category (see [`DiscoveryError::category`]).
    pub category: &'static str,
    /// Rendered error.
    pub message: String,
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.message)
    }
}

fn join_failures(failures: &[ServiceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DiscoveryError {
    /// Create a network error.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a network error for a request that exceeded its timeout.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::network(url, format!("request timed out after {}ms", timeout.as_millis()))
    }

    /// Create an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a decode error.
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Wraps this error as a batch failure for `service`.
    pub fn for_service(&self, service: impl Into<String>) -> ServiceFailure {
        ServiceFailure {
            service: service.into(),
            category: self.category(),
            message: self.to_string(),
        }
    }

    /// Check if retrying later might succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Store(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Get the error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Client { .. } => "client",
            Self::Network { .. } => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::Decode { .. } => "decode",
            Self::Extraction { .. } => "extraction",
            Self::Store(_) => "store",
            Self::Batch { .. } => "batch",
        }
    }
}
