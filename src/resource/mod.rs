//! Resource identity and instance documents.
//!
//! # Data Flow
//! ```text
//! watch event object (JSON)
//!     → document.rs (InstanceDocument, path accessors)
//!     → types.rs (InstanceKey from metadata)
//!
//! watched type (group, version, resource)
//!     → types.rs (GroupVersionResource)
//!     → extractor lookup + metric series name
//! ```

pub mod document;
pub mod types;

pub use document::InstanceDocument;
pub use types::{normalize_metric_name, GroupVersionResource, InstanceKey};
