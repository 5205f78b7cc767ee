//! Schema-specific phase extraction.
//!
//! # Data Flow
//! ```text
//! startup:
//!     ExtractorRegistry::with_builtin()
//!     → registry.lookup(watched type) → Arc<dyn Extractor>
//!
//! per event:
//!     InstanceDocument
//!     → Extractor::get_phase            (current phase name)
//!     → Extractor::get_phase_timestamp  (when that phase was entered)
//! ```
//!
//! # Adding a resource type
//! Implement [`Extractor`] in a new module of this package and register it
//! in [`ExtractorRegistry::with_builtin`]. The recorder does not change.

pub mod example;
pub mod kubevirt;
pub mod pods;
pub mod registry;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::resource::document::join_path;
use crate::resource::InstanceDocument;

pub use registry::{ExtractorRegistry, RegistryError};

/// Reads the phase and the phase entry time from documents of one schema.
///
/// Implementations are pure functions of the document, apart from the
/// explicit [`fall_back_to_now`] policy.
pub trait Extractor: Send + Sync + fmt::Debug {
    /// Current phase name.
    fn get_phase(&self, doc: &InstanceDocument) -> Result<String, ExtractorError>;

    /// Time at which the phase returned by [`Extractor::get_phase`] began.
    fn get_phase_timestamp(&self, doc: &InstanceDocument) -> Result<DateTime<Utc>, ExtractorError>;
}

/// Errors raised while reading fields out of an instance document.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("field {path} has unexpected type, expected {expected}")]
    UnexpectedType { path: String, expected: &'static str },

    #[error("invalid timestamp {value:?} at {path}: {source}")]
    InvalidTimestamp {
        path: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Best-effort phase entry time for schemas or documents without a
/// recorded transition timestamp for the current phase.
pub fn fall_back_to_now() -> DateTime<Utc> {
    Utc::now()
}

/// Parses an RFC 3339 timestamp read from `path`.
pub fn parse_timestamp(path: &[&str], value: &str) -> Result<DateTime<Utc>, ExtractorError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| ExtractorError::InvalidTimestamp {
            path: join_path(path),
            value: value.to_string(),
            source,
        })
}

/// Searches a list of `{<phase_field>: .., <timestamp_field>: ..}` entries
/// for `phase` and returns its parsed timestamp.
///
/// `Ok(None)` means the history is absent or does not mention `phase`.
pub fn phase_timestamp_from_history(
    doc: &InstanceDocument,
    history_path: &[&str],
    phase_field: &str,
    timestamp_field: &str,
    phase: &str,
) -> Result<Option<DateTime<Utc>>, ExtractorError> {
    let Some(entries) = doc.nested_slice(history_path)? else {
        return Ok(None);
    };

    for entry in entries {
        let entry = entry.as_object().ok_or_else(|| ExtractorError::UnexpectedType {
            path: join_path(history_path),
            expected: "array of objects",
        })?;

        if entry.get(phase_field).and_then(|p| p.as_str()) != Some(phase) {
            continue;
        }

        let mut field_path = history_path.to_vec();
        field_path.push(timestamp_field);
        return match entry.get(timestamp_field) {
            Some(serde_json::Value::String(raw)) => parse_timestamp(&field_path, raw).map(Some),
            Some(_) => Err(ExtractorError::UnexpectedType {
                path: join_path(&field_path),
                expected: "string",
            }),
            None => Err(ExtractorError::FieldNotFound(join_path(&field_path))),
        };
    }

    Ok(None)
}
