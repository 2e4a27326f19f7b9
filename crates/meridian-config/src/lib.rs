//! Typed configuration for the Meridian gateway.
//!
//! Configuration is layered: defaults (or a preset), then a TOML or JSON
//! file, then environment overrides. Unknown keys are rejected and the final
//! result is validated.
//!
//! - [`GatewaySection`] - the gateway's own registry identity
//! - [`DiscoverySection`] - fetch timeout, pass interval, failure policy and
//!   statically known services
//! - [`MergeSection`] - merged document metadata and merge behaviour
//! - [`RegistryConfig`] - service registry backing store
//! - [`TelemetrySection`] - logging and metrics
//!
//! # Example
//!
//! ```no_run
//! use meridian_config::ConfigLoader;
//!
//! # fn main() -> Result<(), meridian_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("gateway.toml")?
//!     .with_env_prefix("MERIDIAN")
//!     .load()?;
//!
//! println!("Gateway reachable at {}", config.gateway.to_metadata().base_url());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [gateway]
//! id = "1"
//! name = "gateway"
//! host = "10.0.0.2"
//! http_port = 4000
//!
//! [discovery]
//! timeout_ms = 5000
//! interval_secs = 30
//! failure_policy = "continue"
//!
//! [[discovery.services]]
//! id = "1"
//! name = "users"
//! host = "10.0.0.5"
//! http_port = 8080
//! api_specification_url = "openapi.json"
//!
//! [merge]
//! title = "Public API"
//! conflict_resolution = "merge"
//! prefix_operation_ids = true
//! urls = ["http://legacy.internal/openapi.json"]
//!
//! [registry]
//! host = "127.0.0.1"
//! port = 6379
//!
//! [telemetry]
//! service_name = "meridian-gateway"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `MERIDIAN__GATEWAY__HOST=10.0.0.2`
//! - `MERIDIAN__DISCOVERY__INTERVAL_SECS=60`
//! - `MERIDIAN__MERGE__URLS=http://a/openapi.json,http://b/openapi.json`
//! - `MERIDIAN__TELEMETRY__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{MeridianConfig, MeridianConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use meridian_core::RegistryConfig;
pub use schema::*;
