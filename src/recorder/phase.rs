//! Per-instance phase tracking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::extractors::{Extractor, ExtractorError};
use crate::recorder::sink::{MetricSink, PhaseLabels, PHASE_DURATION_HELP};
use crate::resource::{GroupVersionResource, InstanceDocument, InstanceKey};

/// Per-event errors. The offending event is skipped and the instance table
/// keeps its prior state.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed instance: {0}")]
    MalformedInstance(String),

    #[error("extracting phase of {key}: {source}")]
    Extraction {
        key: InstanceKey,
        #[source]
        source: ExtractorError,
    },
}

/// Phase an instance currently occupies and when it entered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    pub phase: String,
    pub since: DateTime<Utc>,
}

/// A duration measurement emitted for the phase being left.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub key: InstanceKey,
    pub phase: String,
    pub seconds: f64,
}

/// Turns upsert/delete notifications into phase duration measurements.
///
/// Driven by a single consumer; the instance table has exactly one writer
/// and is not shared.
pub struct PhaseRecorder {
    resource: GroupVersionResource,
    series: String,
    final_phase: String,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn MetricSink>,
    records: HashMap<InstanceKey, TrackedRecord>,
}

impl PhaseRecorder {
    pub fn new(
        resource: GroupVersionResource,
        extractor: Arc<dyn Extractor>,
        final_phase: impl Into<String>,
        sink: Arc<dyn MetricSink>,
    ) -> Self {
        let series = resource.metric_series_name();
        sink.describe(&series, PHASE_DURATION_HELP);

        Self {
            resource,
            series,
            final_phase: final_phase.into(),
            extractor,
            sink,
            records: HashMap::new(),
        }
    }

    pub fn resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn final_phase(&self) -> &str {
        &self.final_phase
    }

    pub fn tracked(&self, key: &InstanceKey) -> Option<&TrackedRecord> {
        self.records.get(key)
    }

    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    /// Handle an add or update notification.
    ///
    /// Emits a measurement when the extracted phase differs from the tracked
    /// one. Reaching the final phase releases the instance.
    pub fn observe_upsert(&mut self, doc: &InstanceDocument) -> Result<Option<Transition>, RecordError> {
        let key = doc.key().map_err(RecordError::MalformedInstance)?;

        let phase = self
            .extractor
            .get_phase(doc)
            .map_err(|source| RecordError::Extraction { key: key.clone(), source })?;
        let phase_since = self
            .extractor
            .get_phase_timestamp(doc)
            .map_err(|source| RecordError::Extraction { key: key.clone(), source })?;

        let transition = match self.records.get(&key) {
            Some(existing) if existing.phase != phase => {
                let transition = self.emit(&key, &existing.phase, existing.since, phase_since);
                tracing::info!(
                    namespace = %key.namespace,
                    name = %key.name,
                    from = %transition.phase,
                    to = %phase,
                    seconds = transition.seconds,
                    "Phase transition"
                );
                Some(transition)
            }
            _ => None,
        };

        if phase == self.final_phase {
            if self.records.remove(&key).is_some() {
                tracing::debug!(namespace = %key.namespace, name = %key.name, "Instance reached final phase");
            }
            return Ok(transition);
        }

        self.records.insert(key, TrackedRecord { phase, since: phase_since });
        Ok(transition)
    }

    /// Handle a delete notification.
    ///
    /// Time spent in the last tracked phase is attributed up to the
    /// deletion. Untracked instances emit nothing.
    pub fn observe_delete(&mut self, doc: &InstanceDocument) -> Result<Option<Transition>, RecordError> {
        let key = doc.key().map_err(RecordError::MalformedInstance)?;

        let deleted_at = self
            .extractor
            .get_phase_timestamp(doc)
            .map_err(|source| RecordError::Extraction { key: key.clone(), source })?;

        let transition = self.records.remove(&key).map(|existing| {
            let transition = self.emit(&key, &existing.phase, existing.since, deleted_at);
            tracing::info!(
                namespace = %key.namespace,
                name = %key.name,
                from = %transition.phase,
                seconds = transition.seconds,
                "Instance deleted"
            );
            transition
        });

        Ok(transition)
    }

    fn emit(&self, key: &InstanceKey, phase: &str, since: DateTime<Utc>, until: DateTime<Utc>) -> Transition {
        let seconds = (until - since).num_milliseconds() as f64 / 1000.0;
        let labels = PhaseLabels::new(key.namespace.clone(), key.name.clone(), phase);
        self.sink.set(&self.series, &labels, seconds);

        Transition {
            key: key.clone(),
            phase: phase.to_string(),
            seconds,
        }
    }
}

impl std::fmt::Debug for PhaseRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseRecorder")
            .field("resource", &self.resource)
            .field("series", &self.series)
            .field("final_phase", &self.final_phase)
            .field("tracked", &self.records.len())
            .finish()
    }
}
