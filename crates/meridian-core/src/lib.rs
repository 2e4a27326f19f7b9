//! # Meridian Core
//!
//! Core types and collaborator traits for the Meridian gateway.
//!
//! - [`Route`], [`HttpMethod`], [`route_key`] - The normalized route table entry and its key
//! - [`ApiDocument`] - A service-published API description
//! - [`ServiceMetadata`], [`HttpServiceMetadata`], [`RegisteredService`] - Registry records
//! - [`RouteStore`], [`ServiceRegistry`] - Storage collaborators, with in-memory implementations
//! - [`Service`], [`HttpHost`], [`ShutdownHooks`], [`ShutdownSignal`] - Lifecycle capabilities

#![doc(html_root_url = "https://docs.rs/meridian-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod document;
mod error;
mod lifecycle;
pub mod memory;
mod route;
mod service;
mod shutdown;
mod store;

pub use document::{ApiDocument, DEFAULT_DOCUMENT_TITLE, DEFAULT_DOCUMENT_VERSION, OPENAPI_VERSION};
pub use error::{LifecycleError, LifecycleResult, StoreError, StoreResult};
pub use lifecycle::{HttpHost, Service, ShutdownHook, ShutdownHooks};
pub use memory::{InMemoryRouteStore, InMemoryServiceRegistry};
pub use route::{
    route_key, HttpMethod, HttpProtocol, RateLimit, Route, ServiceProtocol, UnknownMethod,
    ROUTE_KEY_PREFIX,
};
pub use service::{
    service_key, GrpcServiceMetadata, HttpServiceMetadata, RegisteredService, ServiceMetadata,
    SERVICE_KEY_PREFIX,
};
pub use shutdown::{ShutdownReceiver, ShutdownSignal};
pub use store::{RegistryConfig, RouteStore, ServiceRegistry};
