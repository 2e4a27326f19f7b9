//! API description documents.
//!
//! Services publish OpenAPI-style documents. The gateway only reads a handful
//! of well-known fields and otherwise treats the document as opaque JSON, so
//! [`ApiDocument`] is a thin wrapper over [`serde_json::Value`] that keeps
//! every field (and the order of paths and verbs) intact.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Default title for [`ApiDocument::empty`].
pub const DEFAULT_DOCUMENT_TITLE: &str = "API Documentation";

/// Default version for [`ApiDocument::empty`].
pub const DEFAULT_DOCUMENT_VERSION: &str = "1.0.0";

/// OpenAPI version written into generated documents.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// A machine-readable API description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiDocument(Value);

impl ApiDocument {
    /// Wraps a JSON value without validating it.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Creates a document with no paths.
    ///
    /// ```
    /// use meridian_core::ApiDocument;
    ///
    /// let doc = ApiDocument::empty("Users", "2.1.0");
    /// assert_eq!(doc.title(), Some("Users"));
    /// assert!(doc.is_valid());
    /// ```
    pub fn empty(title: &str, version: &str) -> Self {
        Self(json!({
            "openapi": OPENAPI_VERSION,
            "info": {
                "title": title,
                "version": version,
            },
            "paths": {},
        }))
    }

    /// The `openapi` version string.
    pub fn openapi(&self) -> Option<&str> {
        self.0.get("openapi").and_then(Value::as_str)
    }

    /// `info.title`
    pub fn title(&self) -> Option<&str> {
        self.info_field("title")
    }

    /// `info.version`
    pub fn version(&self) -> Option<&str> {
        self.info_field("version")
    }

    /// `info.description`
    pub fn description(&self) -> Option<&str> {
        self.info_field("description")
    }

    fn info_field(&self, field: &str) -> Option<&str> {
        self.0
            .get("info")
            .and_then(|info| info.get(field))
            .and_then(Value::as_str)
    }

    /// The `paths` object, if present and an object.
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.0.get("paths").and_then(Value::as_object)
    }

    /// Returns `true` if the document carries `info.title`, `info.version`
    /// and a `paths` object.
    pub fn is_valid(&self) -> bool {
        self.title().is_some() && self.version().is_some() && self.paths().is_some()
    }

    /// Returns `true` if the document is valid and also declares its
    /// `openapi` version, as required for merge inputs.
    pub fn is_mergeable(&self) -> bool {
        self.openapi().is_some() && self.is_valid()
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Mutably borrows the underlying JSON value.
    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// Unwraps the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for ApiDocument {
    fn default() -> Self {
        Self::empty(DEFAULT_DOCUMENT_TITLE, DEFAULT_DOCUMENT_VERSION)
    }
}

impl From<Value> for ApiDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<ApiDocument> for Value {
    fn from(doc: ApiDocument) -> Self {
        doc.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document() {
        let doc = ApiDocument::default();
        assert_eq!(doc.openapi(), Some("3.0.0"));
        assert_eq!(doc.title(), Some("API Documentation"));
        assert_eq!(doc.version(), Some("1.0.0"));
        assert!(doc.paths().is_some_and(Map::is_empty));
        assert!(doc.is_mergeable());
    }

    #[test]
    fn test_validity() {
        let missing_version = ApiDocument::new(json!({
            "info": { "title": "Users" },
            "paths": {}
        }));
        assert!(!missing_version.is_valid());

        let paths_not_object = ApiDocument::new(json!({
            "info": { "title": "Users", "version": "1" },
            "paths": []
        }));
        assert!(!paths_not_object.is_valid());

        let no_openapi = ApiDocument::new(json!({
            "info": { "title": "Users", "version": "1" },
            "paths": {}
        }));
        assert!(no_openapi.is_valid());
        assert!(!no_openapi.is_mergeable());
    }

    #[test]
    fn test_transparent_serde() {
        let value = json!({
            "openapi": "3.0.3",
            "info": { "title": "Orders", "version": "1.2.0", "description": "Order API" },
            "paths": { "/orders": { "get": {} } },
            "x-custom": true
        });
        let doc: ApiDocument = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(doc.description(), Some("Order API"));
        assert_eq!(serde_json::to_value(&doc).unwrap(), value);
    }

    #[test]
    fn test_paths_keep_document_order() {
        let doc: ApiDocument =
            serde_json::from_str(r#"{"paths":{"/z":{},"/a":{},"/m":{}}}"#).unwrap();
        let keys: Vec<_> = doc.paths().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["/z", "/a", "/m"]);
    }
}
