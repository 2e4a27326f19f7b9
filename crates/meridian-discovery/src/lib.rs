//! # Meridian Discovery
//!
//! Route discovery from service-published API documents.
//!
//! # Overview
//!
//! Every backend service publishes an OpenAPI-style description of its
//! operations. This crate turns those descriptions into the gateway's route
//! table:
//! - [`SchemaFetcher`] fetches a service's document with a bounded timeout
//! - [`RouteExtractor`] walks `paths` and produces normalized [`Route`]s,
//!   detecting required `userId` headers and `x-rate-limit` extensions
//! - [`RouteDiscovery`] runs both for each service and saves the routes
//!   through a [`RouteStore`]
//! - [`DiscoveryJob`] repeats discovery over the registry on an interval
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────────────┐
//!          │   ServiceRegistry    │
//!          └──────────┬───────────┘
//!                     │ HTTP services
//!          ┌──────────▼───────────┐
//!          │   RouteDiscovery     │  one service at a time
//!          └──────────┬───────────┘
//!                     │ GET <scheme>://<host>:<port>/<spec>
//!          ┌──────────▼───────────┐
//!          │   SchemaFetcher      │
//!          └──────────┬───────────┘
//!                     │ ApiDocument
//!          ┌──────────▼───────────┐
//!          │   RouteExtractor     │
//!          └──────────┬───────────┘
//!                     │ Vec<Route>
//!          ┌──────────▼───────────┐
//!          │   RouteStore         │  routes:<METHOD>:<path>
//!          └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meridian_core::{HttpMethod, HttpServiceMetadata, InMemoryRouteStore, ServiceMetadata};
//! use meridian_discovery::{DiscoveryConfig, RouteDiscovery};
//!
//! let store = Arc::new(InMemoryRouteStore::new());
//! let discovery = RouteDiscovery::new(store, DiscoveryConfig::default())?;
//!
//! let users = HttpServiceMetadata::new(
//!     ServiceMetadata::new("1", "users", "10.0.0.12"),
//!     8080,
//!     "openapi.json",
//! );
//! let report = discovery.discover_and_persist(&[users]).await?;
//!
//! let route = discovery.find_route(HttpMethod::Get, "/users").await?;
//! ```
//!
//! [`Route`]: meridian_core::Route
//! [`RouteStore`]: meridian_core::RouteStore

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod job;
pub mod orchestrator;

pub use config::{
    DiscoveryConfig, FailurePolicy, DEFAULT_DISCOVERY_INTERVAL, DEFAULT_FETCH_TIMEOUT,
};
pub use error::{DiscoveryError, DiscoveryResult, ServiceFailure};
pub use extractor::RouteExtractor;
pub use fetcher::{FetchOptions, SchemaFetcher};
pub use job::{DiscoveryJob, MIN_DISCOVERY_INTERVAL};
pub use orchestrator::{DiscoveryReport, RouteDiscovery, ServiceSummary};
