//! Error types for document merging.

use meridian_discovery::DiscoveryError;
use thiserror::Error;

/// Errors that can occur while merging API documents.
#[derive(Debug, Error)]
pub enum MergeError {
    /// No documents were given.
    #[error("cannot merge an empty list of API documents")]
    EmptyInput,

    /// A document lacks `openapi`, `info.title`, `info.version` or `paths`.
    #[error("invalid API document at index {index}")]
    InvalidDocument {
        /// Position of the document in the input.
        index: usize,
    },

    /// Fetching one of the documents failed.
    #[error("failed to fetch API document from {url}: {source}")]
    Fetch {
        /// URL that failed.
        url: String,
        /// Underlying fetch error.
        #[source]
        source: DiscoveryError,
    },
}

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

impl MergeError {
    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, source: DiscoveryError) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Check if retrying later might succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Get the error category.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidDocument { .. } => "invalid_document",
            Self::Fetch { .. } => "fetch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_invalid_document_names_index() {
        let err = MergeError::InvalidDocument { index: 2 };
        assert_eq!(err.to_string(), "invalid API document at index 2");
        assert_eq!(err.category(), "invalid_document");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_fetch_error_names_url_and_keeps_source() {
        let err = MergeError::fetch(
            "http://orders:8080/openapi.json",
            DiscoveryError::http_status("http://orders:8080/openapi.json", 502),
        );
        assert!(err
            .to_string()
            .starts_with("failed to fetch API document from http://orders:8080/openapi.json"));
        assert!(err.source().is_some());
        assert!(err.is_recoverable());
    }
}
