//! # Provider Adapter Registry
//!
//! Thread-safe name-keyed registry for provider adapters. Resolution failures
//! surface as [`FleetError::UnsupportedProvider`] so an execution against an
//! unknown provider name fails loudly instead of silently no-opping.

use crate::error::{FleetError, Result};
use crate::providers::{AwsAdapter, AzureAdapter, DockerAdapter, GcpAdapter, ProviderAdapter};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry mapping internal provider names to adapter implementations
pub struct AdapterRegistry {
    adapters: DashMap<String, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
        }
    }

    /// Create a registry with every built-in provider family registered
    pub fn with_builtin_adapters() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(AwsAdapter::new()));
        registry.register(Arc::new(AzureAdapter::new()));
        registry.register(Arc::new(GcpAdapter::new()));
        registry.register(Arc::new(DockerAdapter::new()));
        info!(
            adapters = registry.len(),
            "📚 ADAPTER REGISTRY: Built-in provider adapters registered"
        );
        registry
    }

    /// Register an adapter under its own provider name. Re-registration
    /// replaces the previous adapter for that name.
    pub fn register(&self, adapter: Arc<dyn ProviderAdapter>) {
        let name = adapter.provider_name().to_string();
        debug!(provider = %name, "Registering provider adapter");
        self.adapters.insert(name, adapter);
    }

    /// Resolve the adapter for a provider's internal name
    pub fn resolve(&self, provider_name: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(provider_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                FleetError::UnsupportedProvider(format!(
                    "no adapter registered for provider '{provider_name}'"
                ))
            })
    }

    pub fn contains(&self, provider_name: &str) -> bool {
        self.adapters.contains_key(provider_name)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Names of all registered providers (for diagnostics endpoints)
    pub fn provider_names(&self) -> Vec<String> {
        self.adapters.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin_adapters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::provider_names;

    #[test]
    fn test_builtin_adapters_registered() {
        let registry = AdapterRegistry::with_builtin_adapters();
        assert_eq!(registry.len(), 4);
        for name in [
            provider_names::AWS,
            provider_names::AZURE,
            provider_names::GCP,
            provider_names::DOCKER,
        ] {
            assert!(registry.contains(name), "missing adapter for {name}");
            assert_eq!(registry.resolve(name).unwrap().provider_name(), name);
        }
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let registry = AdapterRegistry::with_builtin_adapters();
        let err = registry.resolve("openstack").unwrap_err();
        assert!(matches!(err, FleetError::UnsupportedProvider(_)));
    }
}
