//! Template extractor for custom resources (`example.com/v1 examples`).
//!
//! Copy this module for a new custom resource: point the phase path at the
//! schema's phase field and replace the timestamp strategy if the schema
//! records phase transitions.

use chrono::{DateTime, Utc};

use crate::extractors::{fall_back_to_now, Extractor, ExtractorError};
use crate::resource::{GroupVersionResource, InstanceDocument};

const PHASE_PATH: &[&str] = &["status", "phase"];

pub fn resource() -> GroupVersionResource {
    GroupVersionResource::new("example.com", "v1", "examples")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Examples;

impl Extractor for Examples {
    fn get_phase(&self, doc: &InstanceDocument) -> Result<String, ExtractorError> {
        doc.required_str(PHASE_PATH).map(str::to_string)
    }

    // The example schema keeps no transition history.
    fn get_phase_timestamp(&self, _doc: &InstanceDocument) -> Result<DateTime<Utc>, ExtractorError> {
        Ok(fall_back_to_now())
    }
}
