//! Meridian Gateway - route discovery and API document merging
//!
//! The gateway keeps a route table for a multi-service deployment and
//! publishes one merged API document for external consumers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Meridian Gateway                         │
//! │                                                                  │
//! │  ┌──────────────┐  register   ┌──────────────────┐               │
//! │  │   Gateway    │ ──────────► │ ServiceRegistry  │ ◄── services  │
//! │  │              │             └────────┬─────────┘               │
//! │  │              │                      │ HTTP services           │
//! │  │              │  spawn      ┌────────▼─────────┐  GET spec     │
//! │  │              │ ──────────► │  DiscoveryJob    │ ────────────► │
//! │  │              │             └────────┬─────────┘               │
//! │  │              │                      │ routes                  │
//! │  │              │             ┌────────▼─────────┐               │
//! │  │              │             │   RouteStore     │               │
//! │  │              │             └──────────────────┘               │
//! │  │              │  merged_spec ┌─────────────────┐  GET specs    │
//! │  │              │ ───────────► │  MergeFetcher   │ ────────────► │
//! │  └──────────────┘              └─────────────────┘               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! # Keep the route table fresh until Ctrl-C
//! $ meridian-gateway run --config /etc/meridian/gateway.toml
//!
//! # One-off route table and merged document
//! $ meridian-gateway discover -c gateway.toml
//! $ meridian-gateway merge -c gateway.toml -o public-openapi.json
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-gateway/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod gateway;

pub use cli::{Cli, Command};
pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
