//! Loading configuration files from disk.

use std::io::Write;

use meridian_config::{ConfigError, ConfigLoader, LogFormat};
use meridian_discovery::FailurePolicy;
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_loads_complete_toml_file() {
    let file = config_file(
        ".toml",
        r#"
        [gateway]
        id = "7"
        name = "edge"
        host = "10.0.0.2"
        http_port = 4100

        [discovery]
        timeout_ms = 1500
        interval_secs = 45
        failure_policy = "abort"

        [[discovery.services]]
        id = "1"
        name = "users"
        host = "10.0.0.5"
        http_port = 8080

        [[discovery.services]]
        id = "1"
        name = "orders"
        host = "10.0.0.6"
        http_port = 8080
        https_port = 8443
        api_specification_url = "/spec/openapi.json"

        [merge]
        title = "Public API"
        prefix_operation_ids = true
        urls = ["http://legacy.internal/openapi.json"]

        [registry]
        host = "redis.internal"
        db = 2

        [telemetry.logging]
        level = "meridian_discovery=debug,info"
        format = "pretty"
        "#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.gateway.to_metadata().service.key(), "services:edge-7");
    assert_eq!(config.discovery.failure_policy, FailurePolicy::Abort);

    let services = config.discovery.service_metadata();
    assert_eq!(services.len(), 2);
    assert_eq!(
        services[1].api_specification_endpoint(),
        "https://10.0.0.6:8443/spec/openapi.json"
    );

    let options = config.merge.to_merge_options();
    assert_eq!(options.title.as_deref(), Some("Public API"));
    assert!(options.prefix_operation_ids);
    assert!(options.add_service_tags);

    assert_eq!(config.registry.host, "redis.internal");
    assert_eq!(config.registry.port, 6379);
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
}

#[test]
fn test_loads_json_file() {
    let file = config_file(
        ".json",
        r#"{ "gateway": { "http_port": 4200 }, "telemetry": { "metrics": { "enabled": true } } }"#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.gateway.http_port, 4200);
    assert!(config.telemetry.metrics.enabled);
}

#[test]
fn test_rejects_unknown_fields_in_file() {
    let file = config_file(".toml", "[merge]\nconflict = \"merge\"\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_rejects_unsupported_extension() {
    let file = config_file(".yaml", "gateway: {}\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_optional_file_is_loaded_when_present() {
    let file = config_file(".toml", "[discovery]\ninterval_secs = 12\n");
    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.discovery.interval_secs, 12);
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let file = config_file(
        ".toml",
        r#"
        [[discovery.services]]
        id = "1"
        name = ""
        host = "10.0.0.5"
        http_port = 8080
        "#,
    );

    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    assert!(matches!(result, Err(ConfigError::MissingField { .. })));
}
