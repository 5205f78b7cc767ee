//! Resource type and instance identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one resource type served by the cluster API.
///
/// The core group is represented by an empty `group`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// True for resources of the legacy core group (`/api/v1`).
    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }

    /// Name of the gauge series that phase durations of this type are
    /// written to.
    pub fn metric_series_name(&self) -> String {
        normalize_metric_name(&format!(
            "resource_phase_duration_{}_{}_{}_seconds",
            self.group, self.version, self.resource
        ))
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_core() {
            write!(f, "{}.{}", self.resource, self.version)
        } else {
            write!(f, "{}.{}.{}", self.resource, self.version, self.group)
        }
    }
}

/// Replaces characters Prometheus does not accept in metric names.
pub fn normalize_metric_name(name: &str) -> String {
    name.replace(['.', '-'], "_")
}

/// Identity of one tracked instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub namespace: String,
    pub name: String,
}

impl InstanceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
