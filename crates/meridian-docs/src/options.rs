//! Merge options.

use serde::{Deserialize, Serialize};

/// Default title of a merged document.
pub const DEFAULT_MERGED_TITLE: &str = "Merged API Documentation";

/// Default version of a merged document.
pub const DEFAULT_MERGED_VERSION: &str = "1.0.0";

/// How a path present in more than one document is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    /// Combine the verbs of both path items; the later document wins on a
    /// shared verb.
    #[default]
    Merge,
    /// Keep the path item already merged.
    FirstWins,
    /// Replace the path item with the later document's.
    LastWins,
}

/// Options for [`DocumentMerger`](crate::DocumentMerger).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct MergeOptions {
    /// Title of the merged document.
    pub title: Option<String>,
    /// Description of the merged document. Defaults to
    /// `"Combined API documentation from <N> services"`.
    pub description: Option<String>,
    /// Version of the merged document.
    pub version: Option<String>,
    /// Path conflict policy.
    pub conflict_resolution: ConflictResolution,
    /// Rewrite `operationId` to `<service>_<operationId>`.
    pub prefix_operation_ids: bool,
    /// Tag operations with their service and list the services as
    /// top-level tags.
    pub add_service_tags: bool,
    /// Drop `userId` header parameters, inline or referenced.
    pub remove_user_id_headers: bool,
}

impl MergeOptions {
    /// Options with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the conflict policy.
    pub fn conflict_resolution(mut self, policy: ConflictResolution) -> Self {
        self.conflict_resolution = policy;
        self
    }

    /// Enable or disable operation id prefixing.
    pub fn prefix_operation_ids(mut self, enabled: bool) -> Self {
        self.prefix_operation_ids = enabled;
        self
    }

    /// Enable or disable service tags.
    pub fn add_service_tags(mut self, enabled: bool) -> Self {
        self.add_service_tags = enabled;
        self
    }

    /// Enable or disable `userId` header removal.
    pub fn remove_user_id_headers(mut self, enabled: bool) -> Self {
        self.remove_user_id_headers = enabled;
        self
    }

    pub(crate) fn resolved_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_MERGED_TITLE)
    }

    pub(crate) fn resolved_version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_MERGED_VERSION)
    }

    pub(crate) fn resolved_description(&self, documents: usize) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Combined API documentation from {documents} services"))
    }
}
