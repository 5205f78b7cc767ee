//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! collector. All types derive Serde traits for deserialization from config
//! files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resource::GroupVersionResource;
use crate::watch::WatchScope;

/// Root configuration for the phase collector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Resource type and scope to watch.
    pub watch: WatchConfig,

    /// Phase at which an instance is considered done and released.
    pub final_phase: String,

    /// Cluster API connection settings.
    pub cluster: ClusterConfig,

    /// Logging and metrics endpoint settings.
    pub observability: ObservabilityConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            final_phase: "Succeeded".to_string(),
            cluster: ClusterConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Watched resource type and filters.
///
/// Exactly one of `resource` and `kind` is set. A `kind` is resolved to its
/// resource through discovery.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// API group (empty for the core group).
    pub group: String,

    /// API version.
    pub version: String,

    /// Plural resource name (e.g., "virtualmachineinstances").
    pub resource: String,

    /// Kind (e.g., "VirtualMachineInstance").
    pub kind: String,

    /// Namespace to watch; empty watches all namespaces.
    pub namespace: String,

    /// Label selector, e.g. "key1=value1,key2!=value2".
    pub label_selector: String,

    /// Field selector, e.g. "metadata.name=vm-1".
    pub field_selector: String,
}

impl WatchConfig {
    /// The watched type when it is given by resource name.
    pub fn resource_type(&self) -> Option<GroupVersionResource> {
        (!self.resource.is_empty())
            .then(|| GroupVersionResource::new(&self.group, &self.version, &self.resource))
    }

    pub fn scope(&self) -> WatchScope {
        WatchScope {
            namespace: self.namespace.clone(),
            label_selector: self.label_selector.clone(),
            field_selector: self.field_selector.clone(),
        }
    }
}

/// Cluster API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// API server URL. When unset, in-cluster settings are used.
    pub server: Option<String>,

    /// Bearer token.
    pub token: Option<String>,

    /// File holding the bearer token.
    pub token_file: Option<PathBuf>,

    /// PEM bundle used to verify the API server.
    pub ca_file: Option<PathBuf>,

    /// Skip TLS verification of the API server.
    pub insecure_skip_tls_verify: bool,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            server: None,
            token: None,
            token_file: None,
            ca_file: None,
            insecure_skip_tls_verify: false,
            connect_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.final_phase, "Succeeded");
        assert_eq!(config.observability.metrics_address, "0.0.0.0:8080");
        assert!(config.cluster.server.is_none());
        assert!(config.watch.resource_type().is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: CollectorConfig = toml::from_str(
            r#"
            [watch]
            group = "kubevirt.io"
            version = "v1"
            resource = "virtualmachineinstances"
            namespace = "vms"
            "#,
        )
        .unwrap();

        assert_eq!(config.final_phase, "Succeeded");
        assert_eq!(
            config.watch.resource_type(),
            Some(GroupVersionResource::new("kubevirt.io", "v1", "virtualmachineinstances"))
        );
        assert_eq!(config.watch.scope().namespace, "vms");
        assert_eq!(config.cluster.connect_timeout_secs, 10);
    }
}
