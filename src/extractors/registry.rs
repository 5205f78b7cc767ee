//! Binding of resource types to extractors.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::extractors::{example, kubevirt, pods, Extractor};
use crate::resource::GroupVersionResource;

/// Fatal registry errors. Both are detected before any event is processed.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("extractor already registered for: {0}")]
    DuplicateRegistration(GroupVersionResource),

    #[error("extractor not found for: {0}")]
    ExtractorNotFound(GroupVersionResource),
}

/// Table of extractors keyed by resource type.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<GroupVersionResource, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every extractor shipped with the collector.
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(kubevirt::resource(), Arc::new(kubevirt::VirtualMachineInstances))?;
        registry.register(example::resource(), Arc::new(example::Examples))?;
        registry.register(pods::resource(), Arc::new(pods::Pods))?;
        Ok(registry)
    }

    /// Bind `extractor` to `gvr`. An existing binding is never replaced.
    pub fn register(
        &mut self,
        gvr: GroupVersionResource,
        extractor: Arc<dyn Extractor>,
    ) -> Result<(), RegistryError> {
        if self.extractors.contains_key(&gvr) {
            return Err(RegistryError::DuplicateRegistration(gvr));
        }
        tracing::debug!(resource = %gvr, "Registered extractor");
        self.extractors.insert(gvr, extractor);
        Ok(())
    }

    pub fn lookup(&self, gvr: &GroupVersionResource) -> Result<Arc<dyn Extractor>, RegistryError> {
        self.extractors
            .get(gvr)
            .cloned()
            .ok_or_else(|| RegistryError::ExtractorNotFound(gvr.clone()))
    }

    /// Registered resource types, sorted for display.
    pub fn resources(&self) -> Vec<&GroupVersionResource> {
        let mut resources: Vec<_> = self.extractors.keys().collect();
        resources.sort_by_key(|gvr| gvr.to_string());
        resources
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = ExtractorRegistry::with_builtin().unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.lookup(&kubevirt::resource()).is_ok());
        assert!(registry.lookup(&example::resource()).is_ok());
        assert!(registry.lookup(&pods::resource()).is_ok());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ExtractorRegistry::new();
        registry
            .register(kubevirt::resource(), Arc::new(kubevirt::VirtualMachineInstances))
            .unwrap();

        let err = registry
            .register(kubevirt::resource(), Arc::new(example::Examples))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = ExtractorRegistry::new();
        assert!(registry.is_empty());

        let gvr = GroupVersionResource::new("batch", "v1", "jobs");
        let err = registry.lookup(&gvr).unwrap_err();
        assert_eq!(err.to_string(), "extractor not found for: jobs.v1.batch");
    }

    #[test]
    fn test_version_is_part_of_identity() {
        let registry = ExtractorRegistry::with_builtin().unwrap();
        let gvr = GroupVersionResource::new("kubevirt.io", "v1alpha3", "virtualmachineinstances");
        assert!(registry.lookup(&gvr).is_err());
    }
}
