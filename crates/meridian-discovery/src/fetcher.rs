//! Fetching API documents from services.
//!
//! Every fetch is a single GET bounded by [`FetchOptions::timeout`]. The
//! timeout covers both sending the request and reading the body; when it
//! elapses the in-flight request is dropped and the call fails with
//! [`DiscoveryError::Network`].

use std::time::{Duration, Instant};

use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use meridian_core::ApiDocument;
use meridian_telemetry::metrics::{record_schema_fetch, FetchOutcome};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DEFAULT_FETCH_TIMEOUT;
use crate::error::{DiscoveryError, DiscoveryResult};

/// Per-call fetch options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound for the whole request, body included.
    pub timeout: Duration,
    /// Headers sent in addition to the JSON `Accept`/`Content-Type` pair.
    /// A header given here replaces the default of the same name.
    pub headers: HeaderMap,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            headers: HeaderMap::new(),
        }
    }
}

impl FetchOptions {
    /// Options with the given timeout and no extra headers.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// HTTP client for service-published API documents.
#[derive(Debug, Clone)]
pub struct SchemaFetcher {
    client: Client,
}

impl SchemaFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    pub fn new() -> DiscoveryResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DiscoveryError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Creates a fetcher that shares an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches an API document and checks that it carries `info.title`,
    /// `info.version` and a `paths` object.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::Network`] on transport failure or timeout
    /// - [`DiscoveryError::HttpStatus`] on a non-2xx response
    /// - [`DiscoveryError::Decode`] if the body is not JSON or not a valid document
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> DiscoveryResult<ApiDocument> {
        let doc = ApiDocument::new(self.fetch_json(url, options).await?);
        if !doc.is_valid() {
            return Err(DiscoveryError::decode(
                url,
                "document is missing info.title, info.version or a paths object",
            ));
        }
        Ok(doc)
    }

    /// Fetches a URL and decodes the body as JSON without checking its shape.
    pub async fn fetch_json(&self, url: &str, options: &FetchOptions) -> DiscoveryResult<Value> {
        let started = Instant::now();

        let result = tokio::time::timeout(options.timeout, self.get(url, &options.headers))
            .await
            .unwrap_or_else(|_| Err(DiscoveryError::timeout(url, options.timeout)));

        let elapsed = started.elapsed();
        record_schema_fetch(outcome_of(&result), elapsed);
        match &result {
            Ok(_) => debug!(url = %url, duration_ms = elapsed.as_millis() as u64, "Fetched API document"),
            Err(e) => warn!(url = %url, error = %e, "API document fetch failed"),
        }

        result
    }

    async fn get(&self, url: &str, extra: &HeaderMap) -> DiscoveryResult<Value> {
        let response = self
            .client
            .get(url)
            .headers(request_headers(extra))
            .send()
            .await
            .map_err(|e| DiscoveryError::network(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DiscoveryError::network(url, format!("failed to read body: {e}")))?;

        serde_json::from_slice(&body).map_err(|e| DiscoveryError::decode(url, e.to_string()))
    }
}

fn request_headers(extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for name in extra.keys() {
        headers.remove(name);
    }
    for (name, value) in extra {
        headers.append(name, value.clone());
    }
    headers
}

fn outcome_of(result: &DiscoveryResult<Value>) -> FetchOutcome {
    match result {
        Ok(_) => FetchOutcome::Success,
        Err(DiscoveryError::HttpStatus { .. }) => FetchOutcome::HttpError,
        Err(DiscoveryError::Decode { .. }) => FetchOutcome::DecodeError,
        Err(_) => FetchOutcome::NetworkError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    #[test]
    fn test_default_headers() {
        let headers = request_headers(&HeaderMap::new());
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_caller_headers_are_added_and_win() {
        let options = FetchOptions::default()
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .header(ACCEPT, HeaderValue::from_static("application/vnd.oai.openapi+json"));

        let headers = request_headers(&options.headers);
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[ACCEPT], "application/vnd.oai.openapi+json");
        assert_eq!(headers.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_fetch_options_default_timeout() {
        assert_eq!(FetchOptions::default().timeout, Duration::from_millis(5000));
        assert_eq!(
            FetchOptions::with_timeout(Duration::from_secs(1)).timeout,
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(outcome_of(&Ok(Value::Null)), FetchOutcome::Success);
        assert_eq!(
            outcome_of(&Err(DiscoveryError::http_status("u", 500))),
            FetchOutcome::HttpError
        );
        assert_eq!(
            outcome_of(&Err(DiscoveryError::decode("u", "eof"))),
            FetchOutcome::DecodeError
        );
        assert_eq!(
            outcome_of(&Err(DiscoveryError::timeout("u", Duration::from_secs(1)))),
            FetchOutcome::NetworkError
        );
    }
}
