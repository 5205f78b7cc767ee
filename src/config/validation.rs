//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a version and exactly one of resource / kind
//! - Validate the metrics bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CollectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before any connection to the cluster is made

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CollectorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing parameter: {0}")]
    Missing(&'static str),

    #[error("invalid params: only one of resource or kind can be set")]
    ResourceAndKind,

    #[error("final phase must not be empty")]
    EmptyFinalPhase,

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

pub fn validate_config(config: &CollectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let watch = &config.watch;

    if watch.version.is_empty() {
        errors.push(ValidationError::Missing("version"));
    }
    match (watch.resource.is_empty(), watch.kind.is_empty()) {
        (true, true) => errors.push(ValidationError::Missing("resource or kind")),
        (false, false) => errors.push(ValidationError::ResourceAndKind),
        _ => {}
    }

    if config.final_phase.is_empty() {
        errors.push(ValidationError::EmptyFinalPhase);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
