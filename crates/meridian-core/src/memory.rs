//! In-process implementations of [`RouteStore`] and [`ServiceRegistry`].
//!
//! Used by the gateway binary when no external backend is wired in, and by
//! tests throughout the workspace.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::route::{route_key, HttpMethod, Route};
use crate::service::{RegisteredService, SERVICE_KEY_PREFIX};
use crate::store::{RegistryConfig, RouteStore, ServiceRegistry};

/// Route store backed by an insertion-ordered map.
///
/// Routes come back from [`all_routes`](RouteStore::all_routes) in the order
/// they were first saved; re-saving a route replaces it in place.
#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    routes: RwLock<IndexMap<String, Route>>,
}

impl InMemoryRouteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored routes.
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns `true` if no routes are stored.
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Removes every route.
    pub fn clear(&self) {
        self.routes.write().clear();
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn save_route(&self, route: Route) -> StoreResult<()> {
        let key = route.key();
        tracing::trace!(key = %key, service = %route.service_name, "saving route");
        self.routes.write().insert(key, route);
        Ok(())
    }

    async fn all_routes(&self) -> StoreResult<Vec<Route>> {
        Ok(self.routes.read().values().cloned().collect())
    }

    async fn find_route(&self, method: HttpMethod, path: &str) -> StoreResult<Option<Route>> {
        Ok(self.routes.read().get(&route_key(method, path)).cloned())
    }
}

/// Service registry backed by a concurrent hash map.
///
/// [`init`](ServiceRegistry::init) only marks the registry ready; every other
/// call fails with [`StoreError::NotInitialized`] until then. Listings are
/// sorted by key so results are stable.
#[derive(Debug, Default)]
pub struct InMemoryServiceRegistry {
    services: DashMap<String, RegisteredService>,
    ready: AtomicBool,
}

impl InMemoryServiceRegistry {
    /// Creates an uninitialized registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that is already initialized.
    pub fn ready() -> Self {
        let registry = Self::new();
        registry.ready.store(true, Ordering::SeqCst);
        registry
    }

    fn ensure_ready(&self) -> StoreResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    fn sorted(&self, filter: impl Fn(&RegisteredService) -> bool) -> Vec<RegisteredService> {
        let mut entries: Vec<_> = self
            .services
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, service)| service).collect()
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryServiceRegistry {
    async fn init(&self, config: &RegistryConfig) -> StoreResult<()> {
        tracing::debug!(host = %config.host, port = config.port, db = config.db, "in-memory registry ready");
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn register_service(&self, service: RegisteredService) -> StoreResult<()> {
        self.ensure_ready()?;
        let key = service.key();
        tracing::debug!(key = %key, "registering service");
        self.services.insert(key, service);
        Ok(())
    }

    async fn unregister_service(&self, key: &str) -> StoreResult<()> {
        self.ensure_ready()?;
        let namespaced = key
            .strip_prefix(SERVICE_KEY_PREFIX)
            .is_some_and(|rest| rest.starts_with(':'));
        if !namespaced {
            return Err(StoreError::invalid_key(
                key,
                format!("expected '{SERVICE_KEY_PREFIX}:' prefix"),
            ));
        }
        tracing::debug!(key = %key, "unregistering service");
        self.services.remove(key);
        Ok(())
    }

    async fn get_service(&self, key: &str) -> StoreResult<Option<RegisteredService>> {
        self.ensure_ready()?;
        Ok(self.services.get(key).map(|entry| entry.value().clone()))
    }

    async fn registered_services(&self) -> StoreResult<Vec<RegisteredService>> {
        self.ensure_ready()?;
        Ok(self.sorted(|_| true))
    }

    async fn services_by_name(&self, name: &str) -> StoreResult<Vec<RegisteredService>> {
        self.ensure_ready()?;
        Ok(self.sorted(|service| service.metadata().name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::HttpProtocol;
    use crate::service::{HttpServiceMetadata, ServiceMetadata};

    fn http_service(id: &str, name: &str) -> RegisteredService {
        HttpServiceMetadata::new(ServiceMetadata::new(id, name, "localhost"), 3000, "openapi.json")
            .into()
    }

    #[tokio::test]
    async fn test_route_store_upsert() {
        let store = InMemoryRouteStore::new();
        let route = Route::new(HttpMethod::Get, "/users", HttpProtocol::Http, "users");
        store.save_route(route.clone()).await.unwrap();

        let mut replaced = route.clone();
        replaced.require_auth = true;
        store.save_route(replaced).await.unwrap();

        assert_eq!(store.len(), 1);
        let found = store
            .find_route(HttpMethod::Get, "/users")
            .await
            .unwrap()
            .unwrap();
        assert!(found.require_auth);
        assert!(store
            .find_route(HttpMethod::Post, "/users")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_route_store_keeps_first_insert_order() {
        let store = InMemoryRouteStore::new();
        for path in ["/b", "/a", "/c"] {
            store
                .save_route(Route::new(HttpMethod::Get, path, HttpProtocol::Http, "svc"))
                .await
                .unwrap();
        }
        store
            .save_route(Route::new(HttpMethod::Get, "/b", HttpProtocol::Https, "svc"))
            .await
            .unwrap();

        let paths: Vec<_> = store
            .all_routes()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(paths, vec!["/b", "/a", "/c"]);
        assert_eq!(store.route_key(HttpMethod::Get, "/b"), "routes:GET:/b");
    }

    #[tokio::test]
    async fn test_registry_requires_init() {
        let registry = InMemoryServiceRegistry::new();
        let err = registry
            .register_service(http_service("1", "users"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));

        registry.init(&RegistryConfig::default()).await.unwrap();
        registry
            .register_service(http_service("1", "users"))
            .await
            .unwrap();
        assert!(registry
            .get_service("services:users-1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_registry_lookup_and_unregister() {
        let registry = InMemoryServiceRegistry::ready();
        registry.register_service(http_service("2", "users")).await.unwrap();
        registry.register_service(http_service("1", "users")).await.unwrap();
        registry.register_service(http_service("1", "orders")).await.unwrap();
        registry.register_service(http_service("1", "orders")).await.unwrap();

        let all = registry.registered_services().await.unwrap();
        let keys: Vec<_> = all.iter().map(RegisteredService::key).collect();
        assert_eq!(
            keys,
            vec!["services:orders-1", "services:users-1", "services:users-2"]
        );

        assert_eq!(registry.services_by_name("users").await.unwrap().len(), 2);

        registry.unregister_service("services:users-1").await.unwrap();
        registry.unregister_service("services:users-1").await.unwrap();
        assert_eq!(registry.services_by_name("users").await.unwrap().len(), 1);

        let err = registry.unregister_service("users-2").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }
}
