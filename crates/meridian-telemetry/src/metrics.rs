//! Prometheus metrics for Meridian.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `meridian_routes_discovered_total` | Counter | `service` | Routes persisted by discovery |
//! | `meridian_discovery_failures_total` | Counter | `service`, `category` | Failed service discoveries |
//! | `meridian_schema_fetch_duration_seconds` | Histogram | `outcome` | API document fetch latency |
//! | `meridian_documents_merged_total` | Counter | - | Documents folded into merged output |
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Routes discovered counter.
pub const ROUTES_DISCOVERED_TOTAL: &str = "meridian_routes_discovered_total";

/// Discovery failure counter.
pub const DISCOVERY_FAILURES_TOTAL: &str = "meridian_discovery_failures_total";

/// Schema fetch latency histogram.
pub const SCHEMA_FETCH_DURATION_SECONDS: &str = "meridian_schema_fetch_duration_seconds";

/// Merged documents counter.
pub const DOCUMENTS_MERGED_TOTAL: &str = "meridian_documents_merged_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address the Prometheus listener binds to (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Service name, attached to every metric as a global label.
    pub service_name: String,

    /// Histogram buckets for fetch duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            service_name: "meridian-gateway".to_string(),
            duration_buckets: vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        }
    }
}

/// Outcome label for [`record_schema_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Document fetched and decoded.
    Success,
    /// Transport error or timeout.
    NetworkError,
    /// Non-2xx response.
    HttpError,
    /// Body was not a usable document.
    DecodeError,
}

impl FetchOutcome {
    /// Label value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NetworkError => "network_error",
            Self::HttpError => "http_error",
            Self::DecodeError => "decode_error",
        }
    }
}

/// Installs the Prometheus recorder and spawns its HTTP listener.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the exporter cannot be built or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service_name", config.service_name.clone())
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "Prometheus exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(addr = %addr, "Metrics exporter listening");

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        ROUTES_DISCOVERED_TOTAL,
        "Total number of routes persisted by route discovery"
    );
    describe_counter!(
        DISCOVERY_FAILURES_TOTAL,
        "Total number of services whose route discovery failed"
    );
    describe_histogram!(
        SCHEMA_FETCH_DURATION_SECONDS,
        "API document fetch duration in seconds"
    );
    describe_counter!(
        DOCUMENTS_MERGED_TOTAL,
        "Total number of API documents folded into a merged document"
    );
}

/// Records routes persisted for a service.
pub fn record_routes_discovered(service: &str, count: usize) {
    counter!(ROUTES_DISCOVERED_TOTAL, "service" => service.to_string())
        .increment(count as u64);
}

/// Records a failed discovery for a service.
///
/// `category` is the error category (e.g., "network", "http_status").
pub fn record_discovery_failure(service: &str, category: &str) {
    counter!(
        DISCOVERY_FAILURES_TOTAL,
        "service" => service.to_string(),
        "category" => category.to_string()
    )
    .increment(1);
}

/// Records one API document fetch.
pub fn record_schema_fetch(outcome: FetchOutcome, duration: Duration) {
    histogram!(SCHEMA_FETCH_DURATION_SECONDS, "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Records documents folded into a merge.
pub fn record_documents_merged(count: usize) {
    counter!(DOCUMENTS_MERGED_TOTAL).increment(count as u64);
}
