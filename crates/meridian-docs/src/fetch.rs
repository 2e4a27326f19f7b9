//! Fetch-then-merge.
//!
//! [`MergeFetcher`] fetches every URL concurrently, each under its own
//! timeout, and merges the results in URL order. The first failure fails
//! the whole call and drops the fetches still in flight.

use futures_util::future::try_join_all;
use meridian_core::ApiDocument;
use meridian_discovery::{DiscoveryResult, FetchOptions, SchemaFetcher};
use tracing::{debug, info};

use crate::error::{MergeError, MergeResult};
use crate::merger::DocumentMerger;
use crate::options::MergeOptions;

/// Fetches API documents and merges them.
#[derive(Debug, Clone)]
pub struct MergeFetcher {
    fetcher: SchemaFetcher,
}

impl MergeFetcher {
    /// Creates a merge fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`](meridian_discovery::DiscoveryError::Client)
    /// if the HTTP client cannot be built.
    pub fn new() -> DiscoveryResult<Self> {
        Ok(Self::with_fetcher(SchemaFetcher::new()?))
    }

    /// Creates a merge fetcher around an existing fetcher.
    pub fn with_fetcher(fetcher: SchemaFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches every URL and merges the documents.
    ///
    /// Documents are passed to the merger as fetched; their shape is checked
    /// by the merge itself.
    ///
    /// # Errors
    ///
    /// - [`MergeError::Fetch`] naming the first URL that failed
    /// - any error of [`DocumentMerger::merge`]
    pub async fn fetch_and_merge<S: AsRef<str>>(
        &self,
        urls: &[S],
        merge_options: &MergeOptions,
        fetch_options: &FetchOptions,
    ) -> MergeResult<ApiDocument> {
        debug!(urls = urls.len(), "Fetching API documents for merge");

        let docs = try_join_all(urls.iter().map(|url| async move {
            let url = url.as_ref();
            self.fetcher
                .fetch_json(url, fetch_options)
                .await
                .map(ApiDocument::new)
                .map_err(|e| MergeError::fetch(url, e))
        }))
        .await?;

        info!(documents = docs.len(), "Fetched API documents for merge");
        DocumentMerger::new(merge_options.clone()).merge(docs)
    }
}

/// Fetches `urls` with a fresh client and merges the documents.
///
/// # Errors
///
/// See [`MergeFetcher::fetch_and_merge`]. A client construction failure is
/// reported as [`MergeError::Fetch`] for the first URL.
pub async fn fetch_and_merge<S: AsRef<str>>(
    urls: &[S],
    merge_options: &MergeOptions,
    fetch_options: &FetchOptions,
) -> MergeResult<ApiDocument> {
    let fetcher = MergeFetcher::new()
        .map_err(|e| MergeError::fetch(urls.first().map_or("", |url| url.as_ref()), e))?;
    fetcher
        .fetch_and_merge(urls, merge_options, fetch_options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_urls_is_empty_input() {
        let err = MergeFetcher::new()
            .unwrap()
            .fetch_and_merge::<&str>(&[], &MergeOptions::new(), &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::EmptyInput));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_named() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let url = "http://127.0.0.1:9/openapi.json";
        let err = fetch_and_merge(
            &[url],
            &MergeOptions::new(),
            &FetchOptions::with_timeout(std::time::Duration::from_millis(500)),
        )
        .await
        .unwrap_err();

        match err {
            MergeError::Fetch { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
