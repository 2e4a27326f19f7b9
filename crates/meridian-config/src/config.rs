//! Root configuration type.

use std::collections::HashSet;
use std::net::SocketAddr;

use meridian_core::RegistryConfig;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, DiscoverySection, GatewaySection, LogFormat, MergeSection, TelemetrySection,
};

/// Complete gateway configuration.
///
/// # Example
///
/// ```
/// use meridian_config::MeridianConfig;
///
/// let config = MeridianConfig::default();
/// assert_eq!(config.gateway.name, "gateway");
/// assert_eq!(config.discovery.interval_secs, 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MeridianConfig {
    /// The gateway's own identity.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Route discovery.
    #[serde(default)]
    pub discovery: DiscoverySection,

    /// Document merging.
    #[serde(default)]
    pub merge: MergeSection,

    /// Service registry backing store.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl MeridianConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> MeridianConfigBuilder {
        MeridianConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the gateway or a configured service has an empty name or host, or
    ///   port 0
    /// - two configured services share a registry key
    /// - a timeout or the discovery interval is zero
    /// - the log level is not a valid filter directive
    /// - metrics are enabled with an invalid listener address
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_identity(
            "gateway",
            &self.gateway.name,
            &self.gateway.host,
            self.gateway.http_port,
        )?;

        if self.discovery.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "discovery.timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.discovery.interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "discovery.interval_secs",
                "must be greater than 0",
            ));
        }

        let mut keys = HashSet::new();
        for (i, service) in self.discovery.services.iter().enumerate() {
            check_identity(
                &format!("discovery.services[{i}]"),
                &service.name,
                &service.host,
                service.http_port,
            )?;
            let key = service.to_metadata().service.key();
            if !keys.insert(key.clone()) {
                return Err(ConfigError::validation_error(format!(
                    "duplicate service '{key}' in discovery.services"
                )));
            }
        }

        if self.merge.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "merge.timeout_ms",
                "must be greater than 0",
            ));
        }

        if let Err(e) = meridian_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
        {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                e.to_string(),
            ));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs with source locations and
    /// a short discovery interval.
    ///
    /// # Example
    ///
    /// ```
    /// use meridian_config::MeridianConfig;
    ///
    /// let config = MeridianConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;

        config.discovery.interval_secs = 10;

        config
    }

    /// Production preset: JSON logs at `info` and the metrics listener on.
    ///
    /// # Example
    ///
    /// ```
    /// use meridian_config::{LogFormat, MeridianConfig};
    ///
    /// let config = MeridianConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// assert!(config.telemetry.metrics.enabled);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;

        config
    }
}

fn check_identity(section: &str, name: &str, host: &str, port: u16) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::missing_field(format!("{section}.name")));
    }
    if host.trim().is_empty() {
        return Err(ConfigError::missing_field(format!("{section}.host")));
    }
    if port == 0 {
        return Err(ConfigError::invalid_value(
            format!("{section}.http_port"),
            "must be between 1 and 65535",
        ));
    }
    Ok(())
}

/// Builder for [`MeridianConfig`].
#[derive(Debug, Default)]
pub struct MeridianConfigBuilder {
    gateway: Option<GatewaySection>,
    discovery: Option<DiscoverySection>,
    merge: Option<MergeSection>,
    registry: Option<RegistryConfig>,
    telemetry: Option<TelemetrySection>,
}

impl MeridianConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway section.
    #[must_use]
    pub fn gateway(mut self, gateway: GatewaySection) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the discovery section.
    #[must_use]
    pub fn discovery(mut self, discovery: DiscoverySection) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Set the merge section.
    #[must_use]
    pub fn merge(mut self, merge: MergeSection) -> Self {
        self.merge = Some(merge);
        self
    }

    /// Set the registry section.
    #[must_use]
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> MeridianConfig {
        MeridianConfig {
            gateway: self.gateway.unwrap_or_default(),
            discovery: self.discovery.unwrap_or_default(),
            merge: self.merge.unwrap_or_default(),
            registry: self.registry.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<MeridianConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
