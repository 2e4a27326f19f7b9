//! Service metadata published to the service registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::route::{HttpProtocol, Route};

/// Namespace prefix for service keys.
pub const SERVICE_KEY_PREFIX: &str = "services";

/// Builds the registry key for a service: `services:<name>-<id>`.
pub fn service_key(service: &ServiceMetadata) -> String {
    format!("{SERVICE_KEY_PREFIX}:{}-{}", service.name, service.id)
}

/// Metadata shared by every registered service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// Instance identifier.
    pub id: String,
    /// Logical service name.
    pub name: String,
    /// Host name or address the service is reachable on.
    pub host: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Service version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ServiceMetadata {
    /// Creates metadata with the required fields only.
    pub fn new(id: impl Into<String>, name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host: host.into(),
            description: None,
            version: None,
            metadata: Map::new(),
        }
    }

    /// Returns this service's registry key.
    pub fn key(&self) -> String {
        service_key(self)
    }
}

/// Metadata for a service that exposes an HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpServiceMetadata {
    /// Common service metadata.
    #[serde(flatten)]
    pub service: ServiceMetadata,
    /// Plain HTTP port.
    pub http_port: u16,
    /// TLS port; when set, the service is reached over HTTPS on this port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,
    /// Path of the published API description, relative to the base URL.
    pub api_specification_url: String,
    /// Routes registered by hand in addition to discovered ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_routes: Vec<Route>,
}

impl HttpServiceMetadata {
    /// Creates HTTP metadata with no TLS port and no extra routes.
    pub fn new(
        service: ServiceMetadata,
        http_port: u16,
        api_specification_url: impl Into<String>,
    ) -> Self {
        Self {
            service,
            http_port,
            https_port: None,
            api_specification_url: api_specification_url.into(),
            extra_routes: Vec::new(),
        }
    }

    /// Sets the TLS port.
    #[must_use]
    pub fn with_https_port(mut self, port: u16) -> Self {
        self.https_port = Some(port);
        self
    }

    /// Service name shortcut.
    pub fn name(&self) -> &str {
        &self.service.name
    }

    /// HTTPS when a TLS port is configured, HTTP otherwise.
    pub fn protocol(&self) -> HttpProtocol {
        if self.https_port.is_some() {
            HttpProtocol::Https
        } else {
            HttpProtocol::Http
        }
    }

    /// The port matching [`protocol`](Self::protocol).
    pub fn port(&self) -> u16 {
        self.https_port.unwrap_or(self.http_port)
    }

    /// `<scheme>://<host>:<port>`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol(), self.service.host, self.port())
    }

    /// Full URL of the published API description.
    ///
    /// A leading `/` on the configured path is ignored so the URL never
    /// contains an empty segment.
    pub fn api_specification_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url(),
            self.api_specification_url.trim_start_matches('/')
        )
    }
}

/// Metadata for a gRPC service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcServiceMetadata {
    /// Common service metadata.
    #[serde(flatten)]
    pub service: ServiceMetadata,
    /// gRPC port.
    pub grpc_port: u16,
}

/// A service record held by a [`ServiceRegistry`](crate::ServiceRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegisteredService {
    /// An HTTP service; takes part in route discovery.
    Http(HttpServiceMetadata),
    /// A gRPC service.
    Grpc(GrpcServiceMetadata),
}

impl RegisteredService {
    /// Common metadata of the service.
    pub fn metadata(&self) -> &ServiceMetadata {
        match self {
            Self::Http(http) => &http.service,
            Self::Grpc(grpc) => &grpc.service,
        }
    }

    /// Registry key of the service.
    pub fn key(&self) -> String {
        self.metadata().key()
    }

    /// Returns the HTTP metadata if this is an HTTP service.
    pub fn as_http(&self) -> Option<&HttpServiceMetadata> {
        match self {
            Self::Http(http) => Some(http),
            Self::Grpc(_) => None,
        }
    }
}

impl From<HttpServiceMetadata> for RegisteredService {
    fn from(service: HttpServiceMetadata) -> Self {
        Self::Http(service)
    }
}

impl From<GrpcServiceMetadata> for RegisteredService {
    fn from(service: GrpcServiceMetadata) -> Self {
        Self::Grpc(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> HttpServiceMetadata {
        HttpServiceMetadata::new(
            ServiceMetadata::new("a1", "users", "users.internal"),
            8080,
            "openapi.json",
        )
    }

    #[test]
    fn test_service_key() {
        let meta = ServiceMetadata::new("42", "billing", "10.0.0.5");
        assert_eq!(meta.key(), "services:billing-42");
    }

    #[test]
    fn test_base_url_prefers_https() {
        let plain = users();
        assert_eq!(plain.protocol(), HttpProtocol::Http);
        assert_eq!(plain.base_url(), "http://users.internal:8080");

        let tls = users().with_https_port(8443);
        assert_eq!(tls.protocol(), HttpProtocol::Https);
        assert_eq!(tls.port(), 8443);
        assert_eq!(tls.base_url(), "https://users.internal:8443");
    }

    #[test]
    fn test_api_specification_endpoint() {
        assert_eq!(
            users().api_specification_endpoint(),
            "http://users.internal:8080/openapi.json"
        );

        let mut leading_slash = users();
        leading_slash.api_specification_url = "/docs/openapi.json".to_string();
        assert_eq!(
            leading_slash.api_specification_endpoint(),
            "http://users.internal:8080/docs/openapi.json"
        );
    }

    #[test]
    fn test_http_metadata_wire_format() {
        let json = serde_json::json!({
            "id": "a1",
            "name": "users",
            "host": "users.internal",
            "httpPort": 8080,
            "httpsPort": 8443,
            "apiSpecificationUrl": "openapi.json"
        });
        let meta: HttpServiceMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.service.name, "users");
        assert_eq!(meta.https_port, Some(8443));
        assert!(meta.extra_routes.is_empty());
    }

    #[test]
    fn test_registered_service_round_trips_kind() {
        let service = RegisteredService::from(users());
        let json = serde_json::to_value(&service).unwrap();
        assert_eq!(json["kind"], "http");
        assert_eq!(json["httpPort"], 8080);

        let back: RegisteredService = serde_json::from_value(json).unwrap();
        assert_eq!(back.key(), "services:users-a1");
        assert!(back.as_http().is_some());
    }
}
