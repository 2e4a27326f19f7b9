//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use meridian_discovery::FailurePolicy;
use meridian_docs::ConflictResolution;

use crate::{ConfigError, LogFormat, MeridianConfig, ServiceEntry};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "MERIDIAN";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use meridian_config::ConfigLoader;
///
/// # fn main() -> Result<(), meridian_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("gateway.toml")?
///     .with_env_prefix("MERIDIAN")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: MeridianConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MeridianConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = MeridianConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use meridian_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = MeridianConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = MeridianConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked by extension: `.toml` or `.json`. The file
    /// replaces the current configuration; sections and keys it omits take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unsupported.
    ///
    /// # Example
    ///
    /// ```
    /// use meridian_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [gateway]
    ///     http_port = 8000
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.gateway.http_port, 8000);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// - `MERIDIAN__GATEWAY__HTTP_PORT=8000`
    /// - `MERIDIAN__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents into the
    /// process environment. A missing file is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Apply environment overrides (if a prefix was set), validate, and
    /// return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<MeridianConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> MeridianConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<MeridianConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let env_vars: HashMap<String, String> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Gateway section
            ["GATEWAY", "ID"] => config.gateway.id = value.to_string(),
            ["GATEWAY", "NAME"] => config.gateway.name = value.to_string(),
            ["GATEWAY", "HOST"] => config.gateway.host = value.to_string(),
            ["GATEWAY", "HTTP_PORT"] => {
                config.gateway.http_port = parse_value(key, value, "expected port number")?;
            }
            ["GATEWAY", "HTTPS_PORT"] => {
                config.gateway.https_port = parse_optional(key, value, "expected port number")?;
            }
            ["GATEWAY", "API_SPECIFICATION_URL"] => {
                config.gateway.api_specification_url = value.to_string();
            }
            ["GATEWAY", "DESCRIPTION"] => config.gateway.description = optional_string(value),
            ["GATEWAY", "VERSION"] => config.gateway.version = optional_string(value),

            // Discovery section
            ["DISCOVERY", "TIMEOUT_MS"] => {
                config.discovery.timeout_ms = parse_value(key, value, "expected integer")?;
            }
            ["DISCOVERY", "INTERVAL_SECS"] => {
                config.discovery.interval_secs = parse_value(key, value, "expected integer")?;
            }
            ["DISCOVERY", "FAILURE_POLICY"] => {
                config.discovery.failure_policy = match value.to_lowercase().as_str() {
                    "continue" => FailurePolicy::Continue,
                    "abort" => FailurePolicy::Abort,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'continue' or 'abort'",
                        ))
                    }
                };
            }
            ["DISCOVERY", "SERVICES"] => {
                config.discovery.services = serde_json::from_str::<Vec<ServiceEntry>>(value)
                    .map_err(|e| {
                        ConfigError::env_parse_error(key, format!("expected JSON array: {e}"))
                    })?;
            }

            // Merge section
            ["MERGE", "TITLE"] => config.merge.title = optional_string(value),
            ["MERGE", "DESCRIPTION"] => config.merge.description = optional_string(value),
            ["MERGE", "VERSION"] => config.merge.version = optional_string(value),
            ["MERGE", "CONFLICT_RESOLUTION"] => {
                config.merge.conflict_resolution = match value.to_lowercase().as_str() {
                    "merge" => ConflictResolution::Merge,
                    "first-wins" | "first_wins" => ConflictResolution::FirstWins,
                    "last-wins" | "last_wins" => ConflictResolution::LastWins,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'merge', 'first-wins' or 'last-wins'",
                        ))
                    }
                };
            }
            ["MERGE", "PREFIX_OPERATION_IDS"] => {
                config.merge.prefix_operation_ids = parse_flag(key, value)?;
            }
            ["MERGE", "ADD_SERVICE_TAGS"] => {
                config.merge.add_service_tags = parse_flag(key, value)?;
            }
            ["MERGE", "REMOVE_USER_ID_HEADERS"] => {
                config.merge.remove_user_id_headers = parse_flag(key, value)?;
            }
            ["MERGE", "TIMEOUT_MS"] => {
                config.merge.timeout_ms = parse_value(key, value, "expected integer")?;
            }
            ["MERGE", "URLS"] => {
                config.merge.urls = value
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect();
            }

            // Registry section
            ["REGISTRY", "HOST"] => config.registry.host = value.to_string(),
            ["REGISTRY", "PORT"] => {
                config.registry.port = parse_value(key, value, "expected port number")?;
            }
            ["REGISTRY", "PASSWORD"] => config.registry.password = optional_string(value),
            ["REGISTRY", "DB"] => {
                config.registry.db = parse_value(key, value, "expected integer")?;
            }

            // Telemetry section
            ["TELEMETRY", "SERVICE_NAME"] => {
                config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                config.telemetry.metrics.addr = value.to_string();
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, expected))
}

fn parse_optional<T: FromStr>(
    key: &str,
    value: &str,
    expected: &str,
) -> Result<Option<T>, ConfigError> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        parse_value(key, value, expected).map(Some)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn optional_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
