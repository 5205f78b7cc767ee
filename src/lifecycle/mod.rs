//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Registry → Resolve type → Extractor lookup
//!         → Metrics endpoint → Watch → Consumer loop
//!
//! Shutdown (shutdown.rs):
//!     Signal, feed closed or metrics server failure → broadcast → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{Collector, CollectorError};
