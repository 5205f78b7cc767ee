//! Metric sinks for phase durations.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Help text attached to every phase duration series.
pub const PHASE_DURATION_HELP: &str = "Gauge for the time spent in resource phases.";

/// Label set of one phase duration measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhaseLabels {
    pub namespace: String,
    pub name: String,
    pub phase: String,
}

impl PhaseLabels {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            phase: phase.into(),
        }
    }
}

/// Write side of a label-indexed gauge store.
///
/// Repeated writes to the same series and labels overwrite the value.
/// Implementations must tolerate concurrent readers.
pub trait MetricSink: Send + Sync {
    /// Announce a series and its help text. Called once per recorder.
    fn describe(&self, series: &str, help: &'static str);

    /// Set the gauge for `labels` within `series`.
    fn set(&self, series: &str, labels: &PhaseLabels, seconds: f64);
}

/// Sink backed by the `metrics` facade, exported by whichever recorder is
/// installed (Prometheus in the collector binary).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricSink for PrometheusSink {
    fn describe(&self, series: &str, help: &'static str) {
        metrics::describe_gauge!(series.to_string(), help);
    }

    fn set(&self, series: &str, labels: &PhaseLabels, seconds: f64) {
        metrics::gauge!(
            series.to_string(),
            "namespace" => labels.namespace.clone(),
            "name" => labels.name.clone(),
            "phase" => labels.phase.clone()
        )
        .set(seconds);
    }
}

/// In-memory sink keeping the last value per label set and a write log.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: Mutex<HashMap<(String, PhaseLabels), f64>>,
    writes: Mutex<Vec<(String, PhaseLabels, f64)>>,
    help: Mutex<HashMap<String, &'static str>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written for `labels` in `series`.
    pub fn value(&self, series: &str, labels: &PhaseLabels) -> Option<f64> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(series.to_string(), labels.clone()))
            .copied()
    }

    /// Every write in order.
    pub fn writes(&self) -> Vec<(String, PhaseLabels, f64)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn help(&self, series: &str) -> Option<&'static str> {
        self.help
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(series)
            .copied()
    }
}

impl MetricSink for MemorySink {
    fn describe(&self, series: &str, help: &'static str) {
        self.help
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(series.to_string(), help);
    }

    fn set(&self, series: &str, labels: &PhaseLabels, seconds: f64) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((series.to_string(), labels.clone()), seconds);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((series.to_string(), labels.clone(), seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_memory_sink_overwrites() {
        let sink = MemorySink::new();
        let labels = PhaseLabels::new("a", "x", "Pending");

        sink.set("series", &labels, 10.0);
        sink.set("series", &labels, 4.0);

        assert_eq!(sink.value("series", &labels), Some(4.0));
        assert_eq!(sink.write_count(), 2);
        assert_eq!(sink.value("other", &labels), None);
    }

    #[test]
    fn test_prometheus_sink_renders_gauge() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let series = "resource_phase_duration_example_com_v1_examples_seconds";

        metrics::with_local_recorder(&recorder, || {
            let sink = PrometheusSink;
            sink.describe(series, PHASE_DURATION_HELP);
            sink.set(series, &PhaseLabels::new("a", "x", "Pending"), 10.0);
            sink.set(series, &PhaseLabels::new("a", "x", "Pending"), 12.5);
        });

        let rendered = handle.render();
        assert!(rendered.contains(&format!("# HELP {series} {PHASE_DURATION_HELP}")));
        assert!(rendered.contains(&format!("# TYPE {series} gauge")));

        let sample = rendered
            .lines()
            .find(|line| line.starts_with(series))
            .expect("gauge sample rendered");
        assert!(sample.contains("namespace=\"a\""));
        assert!(sample.contains("name=\"x\""));
        assert!(sample.contains("phase=\"Pending\""));
        assert!(sample.ends_with(" 12.5"));
    }
}
