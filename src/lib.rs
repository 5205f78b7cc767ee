//! Resource phase duration collector.
//!
//! Watches one resource type of a cluster API and exports, per instance,
//! how long it spent in each status phase as Prometheus gauges.

pub mod config;
pub mod extractors;
pub mod lifecycle;
pub mod observability;
pub mod recorder;
pub mod resource;
pub mod watch;

pub use config::CollectorConfig;
pub use extractors::{Extractor, ExtractorRegistry};
pub use lifecycle::{Collector, Shutdown};
pub use recorder::PhaseRecorder;
