//! Event source subsystem.
//!
//! # Data Flow
//! ```text
//! ClusterConfig
//!     → client.rs (ClusterClient: auth, discovery, watch request)
//!     → WatchStream (newline-delimited JSON)
//!     → event.rs (WatchEvent)
//!     → consumer.rs (single sequential consumer)
//!     → PhaseRecorder
//! ```
//!
//! # Design Decisions
//! - Exactly one consumer drives the recorder; no locking on its table
//! - A malformed line skips one event; a broken connection ends the loop
//! - No reconnect: the process exits when the feed closes

pub mod client;
pub mod consumer;
pub mod event;

use std::path::PathBuf;

use thiserror::Error;

pub use client::{ClusterClient, WatchScope, WatchStream};
pub use consumer::{run_consumer, ConsumerSummary};
pub use event::WatchEvent;

/// Errors talking to the cluster API.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cluster configuration: {0}")]
    Config(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("cluster API returned {status} for {url}: {body}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    #[error("kind {kind} is not served by {group_version}")]
    KindNotFound { kind: String, group_version: String },

    #[error("watch stream failed: {0}")]
    Transport(#[source] std::io::Error),

    #[error("invalid watch event: {0}")]
    Decode(#[source] serde_json::Error),
}
