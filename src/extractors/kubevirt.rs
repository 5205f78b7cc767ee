//! KubeVirt virtual machine instances (`kubevirt.io/v1`).
//!
//! Phase lives at `status.phase`; entry times are recorded per phase in
//! `status.phaseTransitionTimestamps`.

use chrono::{DateTime, Utc};

use crate::extractors::{fall_back_to_now, phase_timestamp_from_history, Extractor, ExtractorError};
use crate::resource::{GroupVersionResource, InstanceDocument};

const PHASE_PATH: &[&str] = &["status", "phase"];
const TRANSITIONS_PATH: &[&str] = &["status", "phaseTransitionTimestamps"];

pub fn resource() -> GroupVersionResource {
    GroupVersionResource::new("kubevirt.io", "v1", "virtualmachineinstances")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualMachineInstances;

impl Extractor for VirtualMachineInstances {
    fn get_phase(&self, doc: &InstanceDocument) -> Result<String, ExtractorError> {
        doc.required_str(PHASE_PATH).map(str::to_string)
    }

    fn get_phase_timestamp(&self, doc: &InstanceDocument) -> Result<DateTime<Utc>, ExtractorError> {
        let phase = self.get_phase(doc)?;
        let recorded = phase_timestamp_from_history(
            doc,
            TRANSITIONS_PATH,
            "phase",
            "phaseTransitionTimestamp",
            &phase,
        )?;
        Ok(recorded.unwrap_or_else(fall_back_to_now))
    }
}
