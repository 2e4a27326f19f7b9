//! Collaborator interfaces for route and service storage.
//!
//! The gateway never owns a concrete backend. Route discovery writes through
//! a [`RouteStore`], and the gateway publishes itself (and finds the services
//! it discovers routes for) through a [`ServiceRegistry`]. Both are object
//! safe so they can be shared as `Arc<dyn ...>`.
//!
//! All writes are upserts: saving a route or registering a service twice
//! leaves one record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::route::{route_key, HttpMethod, Route};
use crate::service::RegisteredService;

/// Storage for discovered routes, keyed by `routes:<METHOD>:<path>`.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Inserts or replaces the route stored under [`Route::key`].
    async fn save_route(&self, route: Route) -> StoreResult<()>;

    /// Returns every stored route.
    async fn all_routes(&self) -> StoreResult<Vec<Route>>;

    /// Looks up the route for a method and path.
    async fn find_route(&self, method: HttpMethod, path: &str) -> StoreResult<Option<Route>>;

    /// Canonical key for a method and path.
    fn route_key(&self, method: HttpMethod, path: &str) -> String {
        route_key(method, path)
    }
}

/// Connection settings for a registry's backing key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Backing store host.
    pub host: String,
    /// Backing store port.
    pub port: u16,
    /// Optional password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database index.
    pub db: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

/// Registry of running services, keyed by `services:<name>-<id>`.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Connects the registry to its backing store.
    async fn init(&self, config: &RegistryConfig) -> StoreResult<()>;

    /// Inserts or replaces a service record.
    async fn register_service(&self, service: RegisteredService) -> StoreResult<()>;

    /// Removes a service record. Removing an unknown key is not an error.
    async fn unregister_service(&self, key: &str) -> StoreResult<()>;

    /// Looks up a service by key.
    async fn get_service(&self, key: &str) -> StoreResult<Option<RegisteredService>>;

    /// Returns every registered service.
    async fn registered_services(&self) -> StoreResult<Vec<RegisteredService>>;

    /// Returns every instance registered under a service name.
    async fn services_by_name(&self, name: &str) -> StoreResult<Vec<RegisteredService>>;
}
