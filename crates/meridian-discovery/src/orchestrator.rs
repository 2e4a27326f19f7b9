//! Route discovery orchestration.
//!
//! [`RouteDiscovery`] drives one discovery pass: for each service it builds
//! the API document URL, fetches the document, extracts routes and saves
//! them one at a time through the [`RouteStore`].
//!
//! Services are processed strictly in order, so when two services publish
//! the same method and path the later one owns the stored route.

use std::sync::Arc;
use std::time::Instant;

use meridian_core::{route_key, HttpMethod, HttpServiceMetadata, Route, RouteStore};
use meridian_telemetry::metrics::{record_discovery_failure, record_routes_discovered};
use tracing::{debug, error, info};

use crate::config::{DiscoveryConfig, FailurePolicy};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::extractor::RouteExtractor;
use crate::fetcher::{FetchOptions, SchemaFetcher};

/// Routes saved for one service during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    /// Service name.
    pub service: String,
    /// Routes saved, extra routes included.
    pub routes: usize,
}

/// Outcome of a successful discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Per-service results, in discovery order.
    pub services: Vec<ServiceSummary>,
}

impl DiscoveryReport {
    /// Total routes saved across all services.
    pub fn total_routes(&self) -> usize {
        self.services.iter().map(|s| s.routes).sum()
    }
}

/// Discovers routes from service API documents and persists them.
pub struct RouteDiscovery {
    store: Arc<dyn RouteStore>,
    fetcher: SchemaFetcher,
    extractor: RouteExtractor,
    config: DiscoveryConfig,
}

impl std::fmt::Debug for RouteDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDiscovery")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RouteDiscovery {
    /// Creates an orchestrator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`] if the HTTP client cannot be built.
    pub fn new(store: Arc<dyn RouteStore>, config: DiscoveryConfig) -> DiscoveryResult<Self> {
        Ok(Self::with_fetcher(store, SchemaFetcher::new()?, config))
    }

    /// Creates an orchestrator around an existing fetcher.
    pub fn with_fetcher(
        store: Arc<dyn RouteStore>,
        fetcher: SchemaFetcher,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor: RouteExtractor::new(),
            config,
        }
    }

    /// Discovery configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// The route store routes are saved to.
    pub fn store(&self) -> &Arc<dyn RouteStore> {
        &self.store
    }

    /// Canonical lookup key for a method and path: `routes:<METHOD>:<path>`.
    pub fn route_key(method: HttpMethod, path: &str) -> String {
        route_key(method, path)
    }

    /// Fetches a service's API document and extracts its routes without
    /// saving them.
    ///
    /// # Errors
    ///
    /// Returns the fetch or extraction error for the service.
    pub async fn discover_service(
        &self,
        service: &HttpServiceMetadata,
    ) -> DiscoveryResult<Vec<Route>> {
        let url = service.api_specification_endpoint();
        debug!(service = %service.name(), url = %url, "Discovering routes");

        let options = FetchOptions::with_timeout(self.config.fetch_timeout);
        let doc = self.fetcher.fetch(&url, &options).await?;
        self.extractor
            .extract(&doc, service.name(), service.protocol())
    }

    /// Runs one discovery pass over `services`, in order.
    ///
    /// Extracted routes are saved first, then the service's extra routes, so
    /// an extra route replaces an extracted one with the same key.
    ///
    /// Under [`FailurePolicy::Continue`] every service is tried and the
    /// failures are reported together as [`DiscoveryError::Batch`]; routes of
    /// the services that succeeded stay saved. Under
    /// [`FailurePolicy::Abort`] the first failure is returned as is.
    ///
    /// # Errors
    ///
    /// Returns the failures described above.
    pub async fn discover_and_persist(
        &self,
        services: &[HttpServiceMetadata],
    ) -> DiscoveryResult<DiscoveryReport> {
        let started = Instant::now();
        let mut report = DiscoveryReport::default();
        let mut failures = Vec::new();

        for service in services {
            match self.persist_service(service).await {
                Ok(routes) => {
                    record_routes_discovered(service.name(), routes);
                    report.services.push(ServiceSummary {
                        service: service.name().to_string(),
                        routes,
                    });
                }
                Err(e) => {
                    record_discovery_failure(service.name(), e.category());
                    error!(
                        service = %service.name(),
                        url = %service.api_specification_endpoint(),
                        error = %e,
                        "Route discovery failed"
                    );
                    if self.config.failure_policy == FailurePolicy::Abort {
                        return Err(e);
                    }
                    failures.push(e.for_service(service.name()));
                }
            }
        }

        if !failures.is_empty() {
            return Err(DiscoveryError::Batch {
                total: services.len(),
                failures,
            });
        }

        info!(
            services = report.services.len(),
            routes = report.total_routes(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Route discovery completed"
        );
        Ok(report)
    }

    /// Looks up a stored route.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Store`] if the store fails.
    pub async fn find_route(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> DiscoveryResult<Option<Route>> {
        Ok(self.store.find_route(method, path).await?)
    }

    /// Returns every stored route.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Store`] if the store fails.
    pub async fn all_routes(&self) -> DiscoveryResult<Vec<Route>> {
        Ok(self.store.all_routes().await?)
    }

    async fn persist_service(&self, service: &HttpServiceMetadata) -> DiscoveryResult<usize> {
        let routes = self.discover_service(service).await?;
        let mut saved = 0;

        for route in routes.into_iter().chain(service.extra_routes.iter().cloned()) {
            debug!(key = %route.key(), service = %service.name(), "Saving route");
            self.store.save_route(route).await?;
            saved += 1;
        }

        info!(service = %service.name(), routes = saved, "Discovered routes");
        Ok(saved)
    }
}
