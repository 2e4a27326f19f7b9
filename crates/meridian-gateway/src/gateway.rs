//! The gateway service.
//!
//! [`Gateway`] ties the pieces together: it registers itself in the service
//! registry, seeds the statically configured services, keeps the route table
//! fresh with a periodic [`DiscoveryJob`], and merges the registered services'
//! API documents into one public document on demand.

use std::sync::Arc;

use async_trait::async_trait;
use meridian_config::MeridianConfig;
use meridian_core::{
    ApiDocument, HttpHost, HttpServiceMetadata, InMemoryRouteStore, InMemoryServiceRegistry,
    LifecycleError, LifecycleResult, Route, RouteStore, Service, ServiceMetadata, ServiceRegistry,
    ShutdownHooks, ShutdownSignal, StoreResult,
};
use meridian_discovery::{DiscoveryJob, DiscoveryReport, RouteDiscovery, SchemaFetcher};
use meridian_docs::MergeFetcher;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::GatewayResult;

/// API gateway service.
pub struct Gateway {
    metadata: HttpServiceMetadata,
    config: MeridianConfig,
    registry: Arc<dyn ServiceRegistry>,
    discovery: Arc<RouteDiscovery>,
    merger: MergeFetcher,
    hooks: ShutdownHooks,
    shutdown: ShutdownSignal,
    job: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("service", &self.metadata.service.key())
            .field("hooks", &self.hooks)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway over the given collaborators.
    ///
    /// Discovery and merging share one HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: MeridianConfig,
        store: Arc<dyn RouteStore>,
        registry: Arc<dyn ServiceRegistry>,
    ) -> GatewayResult<Self> {
        let fetcher = SchemaFetcher::new()?;
        let discovery = RouteDiscovery::with_fetcher(
            store,
            fetcher.clone(),
            config.discovery.to_discovery_config(),
        );

        Ok(Self {
            metadata: config.gateway.to_metadata(),
            registry,
            discovery: Arc::new(discovery),
            merger: MergeFetcher::with_fetcher(fetcher),
            hooks: ShutdownHooks::new(),
            shutdown: ShutdownSignal::new(),
            job: Mutex::new(None),
            config,
        })
    }

    /// Creates a gateway backed by an in-memory route store and registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn in_memory(config: MeridianConfig) -> GatewayResult<Self> {
        Self::new(
            config,
            Arc::new(InMemoryRouteStore::new()),
            Arc::new(InMemoryServiceRegistry::new()),
        )
    }

    /// Sets the hooks run at the end of [`Service::shutdown`].
    #[must_use]
    pub fn with_shutdown_hooks(mut self, hooks: ShutdownHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the signal that stops the discovery job.
    #[must_use]
    pub fn with_shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Loaded configuration.
    pub fn config(&self) -> &MeridianConfig {
        &self.config
    }

    /// The service registry.
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// The discovery orchestrator.
    pub fn discovery(&self) -> &Arc<RouteDiscovery> {
        &self.discovery
    }

    /// Signal that stops the discovery job.
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Returns `true` while the discovery job started by [`Service::start`]
    /// is attached.
    pub fn is_running(&self) -> bool {
        self.job.lock().is_some()
    }

    /// Connects the registry to its backing store.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn connect(&self) -> StoreResult<()> {
        self.registry.init(&self.config.registry).await
    }

    /// Registers every statically configured service and returns how many
    /// were registered.
    ///
    /// # Errors
    ///
    /// Returns the first registry error.
    pub async fn seed_services(&self) -> StoreResult<usize> {
        let services = self.config.discovery.service_metadata();
        for service in &services {
            debug!(key = %service.service.key(), "Seeding configured service");
            self.registry.register_service(service.clone().into()).await?;
        }
        if !services.is_empty() {
            info!(services = services.len(), "Registered configured services");
        }
        Ok(services.len())
    }

    /// A discovery job over the registry that skips the gateway itself.
    pub fn discovery_job(&self) -> DiscoveryJob {
        DiscoveryJob::new(Arc::clone(&self.discovery), Arc::clone(&self.registry))
            .exclude(self.metadata.service.key())
    }

    /// Runs one discovery pass over the registry.
    ///
    /// # Errors
    ///
    /// Returns the registry or discovery error.
    pub async fn discover_once(&self) -> GatewayResult<DiscoveryReport> {
        Ok(self.discovery_job().run_once().await?)
    }

    /// Every route currently in the route table.
    ///
    /// # Errors
    ///
    /// Returns the route store's error.
    pub async fn routes(&self) -> GatewayResult<Vec<Route>> {
        Ok(self.discovery.all_routes().await?)
    }

    /// API document URLs merged by [`merged_spec`](Self::merged_spec): the
    /// registered HTTP services other than the gateway, ordered by registry
    /// key, followed by the configured extra URLs.
    ///
    /// # Errors
    ///
    /// Returns the registry's error.
    pub async fn spec_urls(&self) -> GatewayResult<Vec<String>> {
        let own_key = self.metadata.service.key();
        let services = self.registry.registered_services().await?;

        Ok(services
            .iter()
            .filter(|service| service.key() != own_key)
            .filter_map(|service| service.as_http())
            .map(HttpServiceMetadata::api_specification_endpoint)
            .chain(self.config.merge.urls.iter().cloned())
            .collect())
    }

    /// Fetches and merges the API documents of every registered service into
    /// the public document.
    ///
    /// # Errors
    ///
    /// Returns the registry error, or the merge error when there is nothing
    /// to merge, a fetch fails, or a document is invalid.
    pub async fn merged_spec(&self) -> GatewayResult<ApiDocument> {
        let urls = self.spec_urls().await?;
        debug!(documents = urls.len(), "Building merged API document");

        let merged = self
            .merger
            .fetch_and_merge(
                &urls,
                &self.config.merge.to_merge_options(),
                &self.config.merge.fetch_options(),
            )
            .await?;

        info!(
            documents = urls.len(),
            paths = merged.paths().map_or(0, serde_json::Map::len),
            "Merged API document built"
        );
        Ok(merged)
    }
}

#[async_trait]
impl Service for Gateway {
    fn info(&self) -> &ServiceMetadata {
        &self.metadata.service
    }

    async fn register(&self) -> LifecycleResult {
        self.connect().await?;
        self.registry
            .register_service(self.metadata.clone().into())
            .await?;
        info!(
            key = %self.metadata.service.key(),
            url = %self.metadata.base_url(),
            "Gateway registered"
        );
        Ok(())
    }

    async fn start(&self) -> LifecycleResult {
        if self.is_running() {
            return Err(LifecycleError::StartupFailed(
                "gateway is already running".to_string(),
            ));
        }

        self.seed_services().await?;

        let handle = self.discovery_job().spawn(self.shutdown.clone());
        *self.job.lock() = Some(handle);

        info!(name = %self.metadata.name(), "Gateway started");
        Ok(())
    }

    async fn shutdown(&self) -> LifecycleResult {
        info!(name = %self.metadata.name(), "Gateway shutting down");
        self.shutdown.trigger();

        let handle = self.job.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Discovery job ended abnormally");
            }
        }

        let unregistered = self
            .registry
            .unregister_service(&self.metadata.service.key())
            .await;
        if let Err(e) = &unregistered {
            warn!(error = %e, "Failed to unregister gateway");
        }

        let hooks = self.hooks.run().await;
        unregistered?;
        hooks
    }
}

impl HttpHost for Gateway {
    fn http_metadata(&self) -> &HttpServiceMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_config::{DiscoverySection, ServiceEntry};
    use meridian_core::{GrpcServiceMetadata, RegisteredService};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn entry(name: &str) -> ServiceEntry {
        ServiceEntry {
            id: "1".to_string(),
            name: name.to_string(),
            host: "127.0.0.1".to_string(),
            http_port: 9,
            https_port: None,
            api_specification_url: "openapi.json".to_string(),
            description: None,
            version: None,
        }
    }

    fn config(services: Vec<ServiceEntry>) -> MeridianConfig {
        MeridianConfig::builder()
            .discovery(DiscoverySection {
                services,
                ..Default::default()
            })
            .build()
    }

    #[tokio::test]
    async fn test_register_publishes_gateway() {
        let gateway = Gateway::in_memory(MeridianConfig::default()).unwrap();
        gateway.register().await.unwrap();

        let stored = gateway
            .registry()
            .get_service("services:gateway-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.as_http(), Some(gateway.http_metadata()));
        assert_eq!(gateway.info().name, "gateway");
    }

    #[tokio::test]
    async fn test_seed_services() {
        let gateway = Gateway::in_memory(config(vec![entry("users"), entry("orders")])).unwrap();
        gateway.connect().await.unwrap();

        assert_eq!(gateway.seed_services().await.unwrap(), 2);
        let names: Vec<_> = gateway
            .registry()
            .registered_services()
            .await
            .unwrap()
            .iter()
            .map(|s| s.metadata().name.clone())
            .collect();
        assert_eq!(names, vec!["orders", "users"]);
    }

    #[tokio::test]
    async fn test_spec_urls_skip_self_and_grpc() {
        let mut config = config(vec![entry("users")]);
        config.merge.urls = vec!["http://legacy.internal/openapi.json".to_string()];
        let gateway = Gateway::in_memory(config).unwrap();

        gateway.register().await.unwrap();
        gateway.seed_services().await.unwrap();
        gateway
            .registry()
            .register_service(RegisteredService::Grpc(GrpcServiceMetadata {
                service: ServiceMetadata::new("1", "billing", "127.0.0.1"),
                grpc_port: 50051,
            }))
            .await
            .unwrap();

        assert_eq!(
            gateway.spec_urls().await.unwrap(),
            vec![
                "http://127.0.0.1:9/openapi.json",
                "http://legacy.internal/openapi.json"
            ]
        );
    }

    #[tokio::test]
    async fn test_merged_spec_with_nothing_registered() {
        let gateway = Gateway::in_memory(MeridianConfig::default()).unwrap();
        gateway.register().await.unwrap();

        let err = gateway.merged_spec().await.unwrap_err();
        assert_eq!(err.category(), "empty_input");
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let hook_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hook_ran);

        let gateway = Gateway::in_memory(MeridianConfig::default())
            .unwrap()
            .with_shutdown_hooks(ShutdownHooks::new().on_shutdown_named("flag", move || {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }));

        gateway.register().await.unwrap();
        gateway.start().await.unwrap();
        assert!(gateway.is_running());
        assert!(matches!(
            gateway.start().await,
            Err(LifecycleError::StartupFailed(_))
        ));

        gateway.shutdown().await.unwrap();
        assert!(!gateway.is_running());
        assert!(gateway.shutdown_signal().is_shutdown());
        assert!(hook_ran.load(Ordering::SeqCst));
        assert!(gateway
            .registry()
            .get_service("services:gateway-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_shutdown_runs_hooks_when_unregister_fails() {
        let hook_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hook_ran);

        // Never registered, so the registry is not initialized.
        let gateway = Gateway::in_memory(MeridianConfig::default())
            .unwrap()
            .with_shutdown_hooks(ShutdownHooks::new().on_shutdown(move || {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }));

        let err = gateway.shutdown().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Store(_)));
        assert!(hook_ran.load(Ordering::SeqCst));
    }
}
