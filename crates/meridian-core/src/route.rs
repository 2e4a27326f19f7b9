//! Routes discovered from service API descriptions.
//!
//! A [`Route`] is the normalized record the gateway dispatches on. Routes are
//! addressed in a route store by a key of the form `routes:<METHOD>:<path>`,
//! built by [`route_key`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace prefix for route keys.
pub const ROUTE_KEY_PREFIX: &str = "routes";

/// Builds the canonical store key for a route.
///
/// # Example
///
/// ```
/// use meridian_core::{route_key, HttpMethod};
///
/// assert_eq!(route_key(HttpMethod::Get, "/users"), "routes:GET:/users");
/// ```
pub fn route_key(method: HttpMethod, path: &str) -> String {
    format!("{ROUTE_KEY_PREFIX}:{method}:{path}")
}

/// Error returned when a string is not a supported HTTP method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

/// HTTP methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
}

impl HttpMethod {
    /// All supported methods.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Options,
        Self::Head,
    ];

    /// Returns the upper-case method name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }

    /// Returns `true` for the methods route discovery produces routes for.
    ///
    /// OPTIONS and HEAD can be registered by hand (for example through a
    /// service's extra routes) but are never discovered from a schema.
    pub const fn is_discoverable(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Post | Self::Put | Self::Delete | Self::Patch
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    /// Parses a method name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Options => Self::OPTIONS,
            HttpMethod::Head => Self::HEAD,
        }
    }
}

/// Protocol used to reach an HTTP backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpProtocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl HttpProtocol {
    /// Returns the URL scheme.
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for HttpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Every protocol a registered service may speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProtocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
    /// gRPC.
    Grpc,
    /// WebSocket.
    Ws,
    /// WebSocket over TLS.
    Wss,
    /// MQTT.
    Mqtt,
    /// Server-sent events.
    Sse,
}

impl From<HttpProtocol> for ServiceProtocol {
    fn from(protocol: HttpProtocol) -> Self {
        match protocol {
            HttpProtocol::Http => Self::Http,
            HttpProtocol::Https => Self::Https,
        }
    }
}

/// Rate limit declared by a service through the `x-rate-limit` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Maximum number of requests per window.
    pub max_requests: u64,
}

/// A normalized, dispatchable route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Path template as published by the service (e.g. `/users/{id}`).
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Protocol used to reach the backend.
    pub protocol: HttpProtocol,
    /// Name of the owning service.
    pub service_name: String,
    /// Logical service type; the first operation tag, or the service name.
    pub service_type: String,
    /// Path on the backend to forward to.
    pub target_path: String,
    /// Whether the route declares that it needs an authenticated caller.
    #[serde(default)]
    pub require_auth: bool,
    /// Declared rate limit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

impl Route {
    /// Creates a route with defaults: service type = service name, target
    /// path = path, no auth, no rate limit.
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        protocol: HttpProtocol,
        service_name: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let service_name = service_name.into();
        Self {
            target_path: path.clone(),
            service_type: service_name.clone(),
            path,
            method,
            protocol,
            service_name,
            require_auth: false,
            rate_limit: None,
        }
    }

    /// Returns this route's store key.
    pub fn key(&self) -> String {
        route_key(self.method, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_format() {
        assert_eq!(route_key(HttpMethod::Get, "/users"), "routes:GET:/users");
        assert_eq!(
            route_key(HttpMethod::Delete, "/users/{id}"),
            "routes:DELETE:/users/{id}"
        );
    }

    #[test]
    fn test_method_parse_ignores_case() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("Patch".parse::<HttpMethod>(), Ok(HttpMethod::Patch));
        assert_eq!("HEAD".parse::<HttpMethod>(), Ok(HttpMethod::Head));
        assert!("parameters".parse::<HttpMethod>().is_err());
        assert!("trace".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_discoverable_methods() {
        let discoverable: Vec<_> = HttpMethod::ALL
            .into_iter()
            .filter(HttpMethod::is_discoverable)
            .collect();
        assert_eq!(
            discoverable,
            vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Delete,
                HttpMethod::Patch
            ]
        );
    }

    #[test]
    fn test_route_defaults() {
        let route = Route::new(HttpMethod::Post, "/orders", HttpProtocol::Https, "orders");
        assert_eq!(route.service_type, "orders");
        assert_eq!(route.target_path, "/orders");
        assert!(!route.require_auth);
        assert!(route.rate_limit.is_none());
        assert_eq!(route.key(), "routes:POST:/orders");
    }

    #[test]
    fn test_route_wire_format() {
        let mut route = Route::new(HttpMethod::Get, "/health", HttpProtocol::Http, "users");
        route.rate_limit = Some(RateLimit {
            window_ms: 60_000,
            max_requests: 100,
        });

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["protocol"], "http");
        assert_eq!(json["serviceName"], "users");
        assert_eq!(json["requireAuth"], false);
        assert_eq!(json["rateLimit"]["windowMs"], 60_000);
        assert_eq!(json["rateLimit"]["maxRequests"], 100);
    }

    #[test]
    fn test_http_method_conversion() {
        assert_eq!(http::Method::from(HttpMethod::Options), http::Method::OPTIONS);
    }
}
