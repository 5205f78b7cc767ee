//! Resource phase duration collector.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                   PHASE COLLECTOR                     │
//!                     │                                                       │
//!   Cluster API       │  ┌──────────┐    ┌──────────┐    ┌───────────────┐    │
//!   watch feed ───────┼─▶│  watch   │───▶│ consumer │───▶│   recorder    │    │
//!                     │  │  client  │    │   loop   │    │ (phase table) │    │
//!                     │  └──────────┘    └──────────┘    └───────┬───────┘    │
//!                     │                                          │            │
//!                     │                  ┌──────────────┐        │            │
//!                     │                  │  extractors  │◀───────┤            │
//!                     │                  │  (registry)  │        ▼            │
//!                     │                  └──────────────┘  ┌───────────────┐  │
//!   Prometheus        │                                    │ metrics sink  │  │
//!   scrape ◀──────────┼────────────── GET /metrics ◀───────│   (gauges)    │  │
//!                     │                                    └───────────────┘  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use phase_collector::config::CliArgs;
use phase_collector::lifecycle::{wait_for_signal, Collector, Shutdown};
use phase_collector::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliArgs::parse().into_config()?;

    init_logging(&config.observability.log_level);
    tracing::info!("phase-collector v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        group = %config.watch.group,
        version = %config.watch.version,
        resource = %config.watch.resource,
        kind = %config.watch.kind,
        final_phase = %config.final_phase,
        metrics_address = %config.observability.metrics_address,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let summary = Collector::new(config)?.run(shutdown).await?;

    tracing::info!(
        upserts = summary.upserts,
        deletes = summary.deletes,
        transitions = summary.transitions,
        "Shutdown complete"
    );
    Ok(())
}
