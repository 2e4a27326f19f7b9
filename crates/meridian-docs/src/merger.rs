//! Merging of API documents.
//!
//! The merged document is seeded from the first input and extended with each
//! following document in order. Inputs are consumed, so the result never
//! shares structure with a caller's copy.
//!
//! Per following document:
//! - its service token is derived from `info.title` (see [`service_name_token`])
//! - new paths are inserted; existing ones follow [`ConflictResolution`]
//! - operations under each path it touched are tagged and/or get their
//!   `operationId` prefixed, when enabled
//! - components are merged per kind; a name already taken is inserted as
//!   `<token>_<name>`
//! - `servers` (by `url`), `tags` (by `name`) and `security` (by value) are
//!   appended when new

use std::collections::HashSet;
use std::sync::OnceLock;

use meridian_core::ApiDocument;
use meridian_telemetry::metrics::record_documents_merged;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{MergeError, MergeResult};
use crate::options::{ConflictResolution, MergeOptions};

/// Token used when a document has no title.
pub const FALLBACK_SERVICE_TOKEN: &str = "service";

const USER_ID: &str = "userId";

/// Merges API documents under a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct DocumentMerger {
    options: MergeOptions,
}

impl DocumentMerger {
    /// Creates a merger.
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Merge options.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges `docs` into one document.
    ///
    /// A single document is returned untouched. With two or more, every
    /// document must carry an `openapi` string, `info.title`, `info.version`
    /// and a `paths` object.
    ///
    /// # Errors
    ///
    /// - [`MergeError::EmptyInput`] if `docs` is empty
    /// - [`MergeError::InvalidDocument`] with the index of the first invalid
    ///   document
    pub fn merge(&self, docs: Vec<ApiDocument>) -> MergeResult<ApiDocument> {
        let total = docs.len();
        if total == 0 {
            return Err(MergeError::EmptyInput);
        }
        if total == 1 {
            return docs.into_iter().next().ok_or(MergeError::EmptyInput);
        }
        if let Some(index) = docs.iter().position(|doc| !doc.is_mergeable()) {
            return Err(MergeError::InvalidDocument { index });
        }

        let mut docs = docs.into_iter().map(ApiDocument::into_value);
        let Some(Value::Object(mut merged)) = docs.next() else {
            return Err(MergeError::InvalidDocument { index: 0 });
        };

        if let Some(info) = merged.get_mut("info").and_then(Value::as_object_mut) {
            info.insert("title".into(), self.options.resolved_title().into());
            info.insert(
                "description".into(),
                self.options.resolved_description(total).into(),
            );
            info.insert("version".into(), self.options.resolved_version().into());
        }
        object_entry(&mut merged, "components");

        let mut tokens: Vec<String> = Vec::new();

        for (offset, doc) in docs.enumerate() {
            let Value::Object(mut doc) = doc else {
                return Err(MergeError::InvalidDocument { index: offset + 1 });
            };

            let token = service_name_token(
                doc.get("info")
                    .and_then(|info| info.get("title"))
                    .and_then(Value::as_str),
            );
            debug!(index = offset + 1, service = %token, "Merging API document");
            if !tokens.contains(&token) {
                tokens.push(token.clone());
            }

            if let (Some(Value::Object(paths)), Some(target)) =
                (doc.remove("paths"), object_entry(&mut merged, "paths"))
            {
                self.merge_paths(target, paths, &token);
            }
            if let (Some(Value::Object(components)), Some(target)) =
                (doc.remove("components"), object_entry(&mut merged, "components"))
            {
                merge_components(target, components, &token);
            }
            append_unique(&mut merged, "servers", doc.remove("servers"), |a, b| {
                a.get("url") == b.get("url")
            });
            append_unique(&mut merged, "tags", doc.remove("tags"), |a, b| {
                a.get("name") == b.get("name")
            });
            append_unique(&mut merged, "security", doc.remove("security"), |a, b| a == b);
        }

        if self.options.add_service_tags {
            let service_tags = tokens
                .iter()
                .map(|token| {
                    serde_json::json!({
                        "name": token,
                        "description": format!("Operations from {token} service"),
                    })
                })
                .collect();
            append_unique(
                &mut merged,
                "tags",
                Some(Value::Array(service_tags)),
                |a, b| a.get("name") == b.get("name"),
            );
        }

        if self.options.remove_user_id_headers {
            strip_user_id_headers(&mut merged);
        }

        record_documents_merged(total);
        let paths = merged
            .get("paths")
            .and_then(Value::as_object)
            .map_or(0, Map::len);
        info!(documents = total, paths, "Merged API documents");

        Ok(ApiDocument::new(Value::Object(merged)))
    }

    fn merge_paths(&self, target: &mut Map<String, Value>, incoming: Map<String, Value>, token: &str) {
        for (path, item) in incoming {
            match target.get_mut(&path) {
                None => {
                    target.insert(path.clone(), item);
                }
                Some(existing) => match self.options.conflict_resolution {
                    ConflictResolution::FirstWins => {}
                    ConflictResolution::LastWins => *existing = item,
                    ConflictResolution::Merge => match item {
                        Value::Object(incoming_verbs) if existing.is_object() => {
                            if let Some(verbs) = existing.as_object_mut() {
                                verbs.extend(incoming_verbs);
                            }
                        }
                        item => *existing = item,
                    },
                },
            }

            if self.options.add_service_tags || self.options.prefix_operation_ids {
                if let Some(Value::Object(item)) = target.get_mut(&path) {
                    for operation in item.values_mut() {
                        if let Value::Object(operation) = operation {
                            self.mark_operation(operation, token);
                        }
                    }
                }
            }
        }
    }

    fn mark_operation(&self, operation: &mut Map<String, Value>, token: &str) {
        if self.options.add_service_tags {
            let tags = operation
                .entry("tags")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(tags) = tags {
                if !tags.iter().any(|tag| tag.as_str() == Some(token)) {
                    tags.insert(0, Value::String(token.to_string()));
                }
            }
        }

        if self.options.prefix_operation_ids {
            if let Some(Value::String(id)) = operation.get_mut("operationId") {
                if !id.is_empty() {
                    *id = format!("{token}_{id}");
                }
            }
        }
    }
}

/// Merges `docs` with `options`.
///
/// Shorthand for `DocumentMerger::new(options.clone()).merge(docs)`.
pub fn merge_documents(docs: Vec<ApiDocument>, options: &MergeOptions) -> MergeResult<ApiDocument> {
    DocumentMerger::new(options.clone()).merge(docs)
}

/// Derives a service token from a document title.
///
/// Whitespace runs become `-`, characters outside `[a-zA-Z0-9-_]` are
/// dropped and the result is lowercased: `"User Service"` gives
/// `"user-service"`. A missing title gives [`FALLBACK_SERVICE_TOKEN`]; a
/// title made only of dropped characters gives an empty token.
pub fn service_name_token(title: Option<&str>) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();

    let Some(title) = title else {
        return FALLBACK_SERVICE_TOKEN.to_string();
    };

    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let disallowed =
        DISALLOWED.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-_]").expect("valid regex"));

    let hyphenated = whitespace.replace_all(title, "-");
    disallowed.replace_all(&hyphenated, "").to_lowercase()
}

/// Returns the object stored under `key`, creating it (or replacing a
/// non-object) first.
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let slot = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
}

fn merge_components(target: &mut Map<String, Value>, incoming: Map<String, Value>, token: &str) {
    for (kind, items) in incoming {
        let Value::Object(items) = items else {
            continue;
        };
        let Some(slot) = object_entry(target, &kind) else {
            continue;
        };
        for (name, value) in items {
            let name = if slot.contains_key(&name) {
                format!("{token}_{name}")
            } else {
                name
            };
            slot.insert(name, value);
        }
    }
}

fn append_unique(
    target: &mut Map<String, Value>,
    key: &str,
    incoming: Option<Value>,
    same: impl Fn(&Value, &Value) -> bool,
) {
    let Some(Value::Array(incoming)) = incoming else {
        return;
    };

    let slot = target
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    let Value::Array(existing) = slot else {
        return;
    };

    for item in incoming {
        if !existing.iter().any(|e| same(e, &item)) {
            existing.push(item);
        }
    }
}

/// Inline parameter object naming the `userId` header. `required` is not
/// considered.
fn is_inline_user_id_header(param: &Value) -> bool {
    param.get("name").and_then(Value::as_str) == Some(USER_ID)
        && param.get("in").and_then(Value::as_str) == Some("header")
}

/// Removes `userId` header parameters from operations and
/// `components.parameters`. Path-level `parameters` are left alone.
///
/// A `$ref` parameter is removed when the last segment of its reference
/// names a `components.parameters` entry that is itself a `userId` header.
/// References are followed one level only.
fn strip_user_id_headers(doc: &mut Map<String, Value>) {
    let referenced: HashSet<String> = doc
        .get("components")
        .and_then(|c| c.get("parameters"))
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .filter(|(_, param)| is_inline_user_id_header(param))
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default();

    let is_user_id = |param: &Value| {
        if is_inline_user_id_header(param) {
            return true;
        }
        param
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| reference.rsplit('/').next())
            .is_some_and(|name| referenced.contains(name))
    };

    if let Some(Value::Object(paths)) = doc.get_mut("paths") {
        for item in paths.values_mut() {
            let Value::Object(item) = item else {
                continue;
            };
            for (key, operation) in item.iter_mut() {
                if key == "parameters" {
                    continue;
                }
                if let Some(Value::Array(params)) = operation.get_mut("parameters") {
                    params.retain(|param| !is_user_id(param));
                }
            }
        }
    }

    if let Some(Value::Object(params)) = doc
        .get_mut("components")
        .and_then(|c| c.get_mut("parameters"))
    {
        params.retain(|_, param| !is_inline_user_id_header(param));
    }
}
