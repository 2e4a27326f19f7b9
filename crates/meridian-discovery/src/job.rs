//! Periodic route discovery.
//!
//! A [`DiscoveryJob`] re-runs discovery over every HTTP service in the
//! registry on a fixed interval until a [`ShutdownSignal`] fires. The first
//! pass runs immediately.

use std::sync::Arc;
use std::time::Duration;

use meridian_core::{HttpServiceMetadata, ServiceRegistry, ShutdownSignal};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::DiscoveryResult;
use crate::orchestrator::{DiscoveryReport, RouteDiscovery};

/// Shortest accepted interval between passes.
pub const MIN_DISCOVERY_INTERVAL: Duration = Duration::from_millis(10);

/// Periodic discovery over the services of a registry.
#[derive(Clone)]
pub struct DiscoveryJob {
    discovery: Arc<RouteDiscovery>,
    registry: Arc<dyn ServiceRegistry>,
    interval: Duration,
    exclude: Vec<String>,
}

impl std::fmt::Debug for DiscoveryJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryJob")
            .field("interval", &self.interval)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl DiscoveryJob {
    /// Creates a job using the interval from the discovery configuration.
    pub fn new(discovery: Arc<RouteDiscovery>, registry: Arc<dyn ServiceRegistry>) -> Self {
        let interval = discovery.config().interval;
        Self {
            discovery,
            registry,
            interval,
            exclude: Vec::new(),
        }
    }

    /// Overrides the interval. Values below [`MIN_DISCOVERY_INTERVAL`] are
    /// raised to it.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Skips the service registered under `key`.
    #[must_use]
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.exclude.push(key.into());
        self
    }

    /// Effective interval between passes.
    pub fn interval(&self) -> Duration {
        self.interval.max(MIN_DISCOVERY_INTERVAL)
    }

    /// HTTP services currently in the registry, minus excluded keys, ordered
    /// by key.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Store`](crate::DiscoveryError::Store) if the
    /// registry cannot be listed.
    pub async fn targets(&self) -> DiscoveryResult<Vec<HttpServiceMetadata>> {
        let services = self.registry.registered_services().await?;
        Ok(services
            .iter()
            .filter(|service| !self.exclude.contains(&service.key()))
            .filter_map(|service| service.as_http().cloned())
            .collect())
    }

    /// Runs a single pass over the current registry contents.
    ///
    /// # Errors
    ///
    /// Returns the registry error or the pass's discovery error.
    pub async fn run_once(&self) -> DiscoveryResult<DiscoveryReport> {
        let targets = self.targets().await?;
        debug!(services = targets.len(), "Starting discovery pass");
        self.discovery.discover_and_persist(&targets).await
    }

    /// Spawns the periodic loop.
    ///
    /// A failed pass is logged and the loop waits for the next tick. The
    /// task ends when `shutdown` is triggered; a pass in flight at that
    /// moment is dropped.
    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        let period = self.interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut stop = shutdown.recv();

            info!(interval_ms = period.as_millis() as u64, "Route discovery job started");

            loop {
                tokio::select! {
                    () = &mut stop => {
                        info!("Route discovery job received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            () = &mut stop => {
                                info!("Route discovery job received shutdown signal");
                                break;
                            }
                            result = self.run_once() => match result {
                                Ok(report) => debug!(
                                    services = report.services.len(),
                                    routes = report.total_routes(),
                                    "Discovery pass finished"
                                ),
                                Err(e) => warn!(error = %e, "Discovery pass failed"),
                            },
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use meridian_core::{
        GrpcServiceMetadata, InMemoryRouteStore, InMemoryServiceRegistry, RegisteredService,
        ServiceMetadata,
    };

    fn job(registry: Arc<InMemoryServiceRegistry>) -> DiscoveryJob {
        let store = Arc::new(InMemoryRouteStore::new());
        let discovery = RouteDiscovery::new(store, DiscoveryConfig::default()).unwrap();
        DiscoveryJob::new(Arc::new(discovery), registry)
    }

    fn http(name: &str) -> HttpServiceMetadata {
        HttpServiceMetadata::new(
            ServiceMetadata::new("1", name, "127.0.0.1"),
            8080,
            "openapi.json",
        )
    }

    #[test]
    fn test_interval_floor() {
        let registry = Arc::new(InMemoryServiceRegistry::ready());
        assert_eq!(job(registry.clone()).interval(), Duration::from_secs(30));
        assert_eq!(
            job(registry).with_interval(Duration::ZERO).interval(),
            MIN_DISCOVERY_INTERVAL
        );
    }

    #[tokio::test]
    async fn test_targets_skip_grpc_and_excluded() {
        let registry = Arc::new(InMemoryServiceRegistry::ready());
        registry
            .register_service(http("users").into())
            .await
            .unwrap();
        registry
            .register_service(http("gateway").into())
            .await
            .unwrap();
        registry
            .register_service(RegisteredService::Grpc(GrpcServiceMetadata {
                service: ServiceMetadata::new("1", "billing", "127.0.0.1"),
                grpc_port: 50051,
            }))
            .await
            .unwrap();

        let targets = job(registry).exclude("services:gateway-1").targets().await.unwrap();
        let names: Vec<_> = targets.iter().map(HttpServiceMetadata::name).collect();
        assert_eq!(names, vec!["users"]);
    }

    #[tokio::test]
    async fn test_uninitialized_registry_fails_pass() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let err = job(registry).run_once().await.unwrap_err();
        assert_eq!(err.category(), "store");
    }

    #[tokio::test]
    async fn test_spawned_job_stops_on_shutdown() {
        let registry = Arc::new(InMemoryServiceRegistry::ready());
        let shutdown = ShutdownSignal::new();

        let handle = job(registry)
            .with_interval(Duration::from_millis(20))
            .spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("job did not stop")
            .unwrap();
    }
}
