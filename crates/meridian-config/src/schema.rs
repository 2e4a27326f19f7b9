//! Configuration schema types.
//!
//! Each section deserializes strictly: unknown keys are rejected and every
//! omitted key falls back to its default.

use std::time::Duration;

use meridian_core::{HttpServiceMetadata, ServiceMetadata};
use meridian_discovery::{DiscoveryConfig, FailurePolicy, FetchOptions};
use meridian_docs::{ConflictResolution, MergeOptions};
use meridian_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// The gateway's own service record.
///
/// The gateway registers itself under this identity and is excluded from
/// its own discovery passes.
///
/// # Example
///
/// ```
/// use meridian_config::GatewaySection;
///
/// let gateway = GatewaySection::default();
/// assert_eq!(gateway.to_metadata().base_url(), "http://127.0.0.1:4000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    /// Instance id.
    #[serde(default = "default_gateway_id")]
    pub id: String,

    /// Service name.
    #[serde(default = "default_gateway_name")]
    pub name: String,

    /// Host other services reach the gateway on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Plain HTTP port.
    #[serde(default = "default_gateway_port")]
    pub http_port: u16,

    /// TLS port.
    #[serde(default)]
    pub https_port: Option<u16>,

    /// Path of the gateway's own API document.
    #[serde(default = "default_api_specification_url")]
    pub api_specification_url: String,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// Deployed version.
    #[serde(default)]
    pub version: Option<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            id: default_gateway_id(),
            name: default_gateway_name(),
            host: default_host(),
            http_port: default_gateway_port(),
            https_port: None,
            api_specification_url: default_api_specification_url(),
            description: None,
            version: None,
        }
    }
}

impl GatewaySection {
    /// Registry metadata for the gateway.
    pub fn to_metadata(&self) -> HttpServiceMetadata {
        http_metadata(
            ServiceMetadata {
                description: self.description.clone(),
                version: self.version.clone(),
                ..ServiceMetadata::new(&self.id, &self.name, &self.host)
            },
            self.http_port,
            self.https_port,
            &self.api_specification_url,
        )
    }
}

fn default_gateway_id() -> String {
    "1".to_string()
}

fn default_gateway_name() -> String {
    "gateway".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    4000
}

fn default_api_specification_url() -> String {
    "openapi.json".to_string()
}

/// A statically configured downstream service, seeded into the registry at
/// start-up.
///
/// # Example
///
/// ```
/// use meridian_config::ServiceEntry;
///
/// let entry: ServiceEntry = toml::from_str(r#"
///     id = "1"
///     name = "users"
///     host = "10.0.0.5"
///     http_port = 8080
/// "#).unwrap();
///
/// assert_eq!(
///     entry.to_metadata().api_specification_endpoint(),
///     "http://10.0.0.5:8080/openapi.json"
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceEntry {
    /// Instance id.
    pub id: String,

    /// Service name.
    pub name: String,

    /// Host the service listens on.
    pub host: String,

    /// Plain HTTP port.
    pub http_port: u16,

    /// TLS port. When set the service is reached over HTTPS.
    #[serde(default)]
    pub https_port: Option<u16>,

    /// Path of the published API document.
    #[serde(default = "default_api_specification_url")]
    pub api_specification_url: String,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// Deployed version.
    #[serde(default)]
    pub version: Option<String>,
}

impl ServiceEntry {
    /// Registry metadata for the service.
    pub fn to_metadata(&self) -> HttpServiceMetadata {
        http_metadata(
            ServiceMetadata {
                description: self.description.clone(),
                version: self.version.clone(),
                ..ServiceMetadata::new(&self.id, &self.name, &self.host)
            },
            self.http_port,
            self.https_port,
            &self.api_specification_url,
        )
    }
}

fn http_metadata(
    service: ServiceMetadata,
    http_port: u16,
    https_port: Option<u16>,
    api_specification_url: &str,
) -> HttpServiceMetadata {
    let metadata = HttpServiceMetadata::new(service, http_port, api_specification_url);
    match https_port {
        Some(port) => metadata.with_https_port(port),
        None => metadata,
    }
}

/// Route discovery section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    /// Timeout for each API document fetch, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds between periodic discovery passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// What a pass does when a service fails.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Services registered at start-up.
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            interval_secs: default_interval_secs(),
            failure_policy: FailurePolicy::default(),
            services: Vec::new(),
        }
    }
}

impl DiscoverySection {
    /// Runtime discovery configuration.
    pub fn to_discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig::default()
            .with_fetch_timeout(Duration::from_millis(self.timeout_ms))
            .with_interval(Duration::from_secs(self.interval_secs))
            .with_failure_policy(self.failure_policy)
    }

    /// Registry metadata for every configured service, in file order.
    pub fn service_metadata(&self) -> Vec<HttpServiceMetadata> {
        self.services.iter().map(ServiceEntry::to_metadata).collect()
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_interval_secs() -> u64 {
    30
}

/// Document merge section.
///
/// Unlike [`MergeOptions::default`], the gateway tags operations with their
/// service and strips `userId` headers unless told otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MergeSection {
    /// Merged document title.
    #[serde(default)]
    pub title: Option<String>,

    /// Merged document description.
    #[serde(default)]
    pub description: Option<String>,

    /// Merged document version.
    #[serde(default)]
    pub version: Option<String>,

    /// Policy for paths published by more than one service.
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,

    /// Prefix operation ids with the service name.
    #[serde(default)]
    pub prefix_operation_ids: bool,

    /// Tag operations with their service.
    #[serde(default = "default_true")]
    pub add_service_tags: bool,

    /// Remove `userId` header parameters.
    #[serde(default = "default_true")]
    pub remove_user_id_headers: bool,

    /// Timeout for each document fetch, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra document URLs merged after the registered services.
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            version: None,
            conflict_resolution: ConflictResolution::default(),
            prefix_operation_ids: false,
            add_service_tags: true,
            remove_user_id_headers: true,
            timeout_ms: default_timeout_ms(),
            urls: Vec::new(),
        }
    }
}

impl MergeSection {
    /// Merge options for this section.
    pub fn to_merge_options(&self) -> MergeOptions {
        MergeOptions {
            title: self.title.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            conflict_resolution: self.conflict_resolution,
            prefix_operation_ids: self.prefix_operation_ids,
            add_service_tags: self.add_service_tags,
            remove_user_id_headers: self.remove_user_id_headers,
        }
    }

    /// Fetch options for the documents being merged.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

fn default_true() -> bool {
    true
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name attached to logs and metrics.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Runtime telemetry configuration.
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let logging = LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            json_format: self.logging.format == LogFormat::Json,
            file_line_info: self.logging.include_location,
            ..LogConfig::default()
        };
        let metrics = MetricsConfig {
            enabled: self.metrics.enabled,
            addr: self.metrics.addr.clone(),
            ..MetricsConfig::default()
        };

        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .logging(logging)
            .metrics(metrics)
            .build()
    }
}

fn default_service_name() -> String {
    "meridian-gateway".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `meridian_discovery=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in log records.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus metrics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Serve metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
