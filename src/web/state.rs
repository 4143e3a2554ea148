use crate::discovery::DiscoveryReconciler;
use crate::orchestration::TaskOrchestrator;
use crate::registry::AdapterRegistry;
use crate::storage::Stores;
use std::sync::Arc;

/// Shared state for the web API
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub reconciler: Arc<DiscoveryReconciler>,
    pub stores: Stores,
    pub registry: Arc<AdapterRegistry>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<TaskOrchestrator>,
        reconciler: Arc<DiscoveryReconciler>,
        stores: Stores,
        registry: Arc<AdapterRegistry>,
    ) -> Self {
        Self {
            orchestrator,
            reconciler,
            stores,
            registry,
        }
    }
}
