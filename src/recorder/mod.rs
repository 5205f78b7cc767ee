//! Phase duration recording.
//!
//! # Data Flow
//! ```text
//! upsert(doc)                          delete(doc)
//!     → key + (phase, since)               → key + timestamp
//!     → phase changed? emit(old phase)     → tracked? emit(last phase)
//!     → final phase? release : store       → release
//!                  │
//!                  ▼
//!     sink.rs (MetricSink: namespace, name, phase → seconds)
//! ```
//!
//! # Design Decisions
//! - A measurement is always labeled with the phase being left
//! - Identical phase values never emit, whatever their timestamps
//! - Failed events leave the instance table untouched

pub mod phase;
pub mod sink;

pub use phase::{PhaseRecorder, RecordError, TrackedRecord, Transition};
pub use sink::{MemorySink, MetricSink, PhaseLabels, PrometheusSink, PHASE_DURATION_HELP};
