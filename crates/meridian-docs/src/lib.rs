//! # Meridian Docs
//!
//! Merging of service API documents into the gateway's public document.
//!
//! This crate provides:
//! - **[`DocumentMerger`]** combining N documents under a [`ConflictResolution`]
//!   policy, with optional service tagging, `operationId` prefixing and
//!   `userId` header removal
//! - **[`MergeFetcher`]** fetching N documents concurrently and merging them
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meridian_discovery::FetchOptions;
//! use meridian_docs::{ConflictResolution, MergeFetcher, MergeOptions};
//!
//! let options = MergeOptions::new()
//!     .title("Public API")
//!     .conflict_resolution(ConflictResolution::Merge)
//!     .add_service_tags(true)
//!     .remove_user_id_headers(true);
//!
//! let merged = MergeFetcher::new()?
//!     .fetch_and_merge(
//!         &["http://users:8080/openapi.json", "http://orders:8080/openapi.json"],
//!         &options,
//!         &FetchOptions::default(),
//!     )
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod fetch;
mod merger;
mod options;

pub use error::{MergeError, MergeResult};
pub use fetch::{fetch_and_merge, MergeFetcher};
pub use merger::{merge_documents, service_name_token, DocumentMerger, FALLBACK_SERVICE_TOKEN};
pub use options::{
    ConflictResolution, MergeOptions, DEFAULT_MERGED_TITLE, DEFAULT_MERGED_VERSION,
};
