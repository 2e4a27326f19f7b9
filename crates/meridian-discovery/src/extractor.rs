//! Route extraction from API documents.
//!
//! Walks `paths` in document order and emits one [`Route`] per
//! GET/POST/PUT/DELETE/PATCH operation. Everything else under a path item
//! (`parameters`, `summary`, `options`, `x-*` ...) is skipped.

use meridian_core::{ApiDocument, HttpMethod, HttpProtocol, RateLimit, Route};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{DiscoveryError, DiscoveryResult};

/// Header parameter whose required presence marks a route as authenticated.
pub const AUTH_HEADER_PARAMETER: &str = "userId";

/// Operation extension carrying a rate limit.
pub const RATE_LIMIT_EXTENSION: &str = "x-rate-limit";

/// Turns API documents into routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteExtractor;

impl RouteExtractor {
    /// Creates an extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts the routes of `doc` for `service_name`.
    ///
    /// Routes come out in document order: paths first, then verbs within a
    /// path. An operation that is not an object yields a route with default
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Extraction`] if `paths` is missing or not an
    /// object, or if a path item is not an object.
    pub fn extract(
        &self,
        doc: &ApiDocument,
        service_name: &str,
        protocol: HttpProtocol,
    ) -> DiscoveryResult<Vec<Route>> {
        let paths = match doc.as_value().get("paths") {
            Some(Value::Object(paths)) => paths,
            Some(_) => return Err(DiscoveryError::extraction("`paths` is not an object")),
            None => return Err(DiscoveryError::extraction("document has no `paths`")),
        };

        let mut routes = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                return Err(DiscoveryError::extraction(format!(
                    "path item for '{path}' is not an object"
                )));
            };

            for (key, operation) in item {
                let Some(method) = key
                    .parse::<HttpMethod>()
                    .ok()
                    .filter(HttpMethod::is_discoverable)
                else {
                    continue;
                };

                let route = build_route(path, method, operation, service_name, protocol);
                debug!(
                    service = %service_name,
                    method = %route.method,
                    path = %route.path,
                    require_auth = route.require_auth,
                    "Extracted route"
                );
                routes.push(route);
            }
        }

        Ok(routes)
    }
}

fn build_route(
    path: &str,
    method: HttpMethod,
    operation: &Value,
    service_name: &str,
    protocol: HttpProtocol,
) -> Route {
    let mut route = Route::new(method, path, protocol, service_name);

    let Some(operation) = operation.as_object() else {
        return route;
    };

    route.require_auth = requires_auth(operation);

    if let Some(tag) = first_tag(operation) {
        route.service_type = tag.to_string();
    }

    if let Some(raw) = operation.get(RATE_LIMIT_EXTENSION) {
        match serde_json::from_value::<RateLimit>(raw.clone()) {
            Ok(limit) => route.rate_limit = Some(limit),
            Err(e) => warn!(
                service = %service_name,
                method = %method,
                path = %path,
                error = %e,
                "Ignoring malformed x-rate-limit"
            ),
        }
    }

    route
}

/// True if the operation declares an inline, required `userId` header.
/// `$ref` parameters are not followed.
fn requires_auth(operation: &Map<String, Value>) -> bool {
    operation
        .get("parameters")
        .and_then(Value::as_array)
        .is_some_and(|params| {
            params.iter().any(|param| {
                param.get("name").and_then(Value::as_str) == Some(AUTH_HEADER_PARAMETER)
                    && param.get("in").and_then(Value::as_str) == Some("header")
                    && param.get("required").and_then(Value::as_bool) == Some(true)
            })
        })
}

fn first_tag(operation: &Map<String, Value>) -> Option<&str> {
    operation
        .get("tags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(doc: Value) -> DiscoveryResult<Vec<Route>> {
        RouteExtractor::new().extract(&ApiDocument::new(doc), "users", HttpProtocol::Http)
    }

    fn user_id_header(required: Value, location: &str) -> Value {
        json!({ "name": "userId", "in": location, "required": required })
    }

    #[test]
    fn test_required_user_id_header_requires_auth() {
        let routes = extract(json!({
            "paths": {
                "/me": { "get": { "parameters": [user_id_header(json!(true), "header")] } }
            }
        }))
        .unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].require_auth);
    }

    #[test]
    fn test_optional_or_query_user_id_does_not_require_auth() {
        let routes = extract(json!({
            "paths": {
                "/a": { "get": { "parameters": [user_id_header(json!(false), "header")] } },
                "/b": { "get": { "parameters": [user_id_header(json!(true), "query")] } },
                "/c": { "get": { "parameters": [user_id_header(json!("true"), "header")] } },
                "/d": { "get": { "parameters": [{ "$ref": "#/components/parameters/UserId" }] } }
            }
        }))
        .unwrap();
        assert_eq!(routes.len(), 4);
        assert!(routes.iter().all(|r| !r.require_auth));
    }

    #[test]
    fn test_non_verb_keys_are_skipped() {
        let routes = extract(json!({
            "paths": {
                "/users/{id}": {
                    "summary": "A user",
                    "parameters": [{ "name": "id", "in": "path", "required": true }],
                    "options": {},
                    "head": {},
                    "trace": {},
                    "x-internal": true,
                    "get": {},
                    "DELETE": {}
                }
            }
        }))
        .unwrap();

        let methods: Vec<_> = routes.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Delete]);
    }

    #[test]
    fn test_document_order() {
        let routes = extract(json!({
            "paths": {
                "/z": { "post": {}, "get": {} },
                "/a": { "patch": {}, "put": {} }
            }
        }))
        .unwrap();

        let keys: Vec<_> = routes.iter().map(Route::key).collect();
        assert_eq!(
            keys,
            vec!["routes:POST:/z", "routes:GET:/z", "routes:PATCH:/a", "routes:PUT:/a"]
        );
    }

    #[test]
    fn test_service_type_and_defaults() {
        let routes = extract(json!({
            "paths": {
                "/tagged": { "get": { "tags": ["accounts", "admin"] } },
                "/untagged": { "get": { "tags": [] } },
                "/empty-tag": { "get": { "tags": [""] } }
            }
        }))
        .unwrap();

        assert_eq!(routes[0].service_type, "accounts");
        assert_eq!(routes[1].service_type, "users");
        assert_eq!(routes[2].service_type, "users");
        for route in &routes {
            assert_eq!(route.service_name, "users");
            assert_eq!(route.target_path, route.path);
            assert_eq!(route.protocol, HttpProtocol::Http);
        }
    }

    #[test]
    fn test_rate_limit_extension() {
        let routes = extract(json!({
            "paths": {
                "/limited": { "post": { "x-rate-limit": { "windowMs": 60000, "maxRequests": 10 } } },
                "/broken": { "post": { "x-rate-limit": "fast" } },
                "/free": { "post": {} }
            }
        }))
        .unwrap();

        assert_eq!(
            routes[0].rate_limit,
            Some(RateLimit {
                window_ms: 60_000,
                max_requests: 10
            })
        );
        assert!(routes[1].rate_limit.is_none());
        assert!(routes[2].rate_limit.is_none());
    }

    #[test]
    fn test_malformed_operation_is_tolerated() {
        let routes = extract(json!({
            "paths": { "/odd": { "get": null, "put": "nope" } }
        }))
        .unwrap();

        assert_eq!(routes.len(), 2);
        assert!(!routes[0].require_auth);
        assert_eq!(routes[1].service_type, "users");
    }

    #[test]
    fn test_malformed_paths_fail() {
        assert!(matches!(
            extract(json!({ "info": {} })),
            Err(DiscoveryError::Extraction { .. })
        ));
        assert!(matches!(
            extract(json!({ "paths": ["/users"] })),
            Err(DiscoveryError::Extraction { .. })
        ));
        assert!(matches!(
            extract(json!({ "paths": { "/users": "get" } })),
            Err(DiscoveryError::Extraction { .. })
        ));
    }

    #[test]
    fn test_https_protocol_is_carried() {
        let doc = ApiDocument::new(json!({ "paths": { "/x": { "get": {} } } }));
        let routes = RouteExtractor::new()
            .extract(&doc, "secure", HttpProtocol::Https)
            .unwrap();
        assert_eq!(routes[0].protocol, HttpProtocol::Https);
    }
}
