//! Core pods (`v1 pods`).
//!
//! Pods carry no per-phase history. `status.startTime` marks the start of
//! `Running`; other phases use the fallback.

use chrono::{DateTime, Utc};

use crate::extractors::{fall_back_to_now, parse_timestamp, Extractor, ExtractorError};
use crate::resource::{GroupVersionResource, InstanceDocument};

const PHASE_PATH: &[&str] = &["status", "phase"];
const START_TIME_PATH: &[&str] = &["status", "startTime"];

pub fn resource() -> GroupVersionResource {
    GroupVersionResource::new("", "v1", "pods")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pods;

impl Extractor for Pods {
    fn get_phase(&self, doc: &InstanceDocument) -> Result<String, ExtractorError> {
        doc.required_str(PHASE_PATH).map(str::to_string)
    }

    fn get_phase_timestamp(&self, doc: &InstanceDocument) -> Result<DateTime<Utc>, ExtractorError> {
        if self.get_phase(doc)? != "Running" {
            return Ok(fall_back_to_now());
        }
        match doc.nested_str(START_TIME_PATH)? {
            Some(raw) => parse_timestamp(START_TIME_PATH, raw),
            None => Ok(fall_back_to_now()),
        }
    }
}
