#![allow(dead_code)]

//! Shared test fixtures: a programmable provider adapter and a pre-seeded
//! in-memory environment.

use async_trait::async_trait;
use fleetops_core::events::EventPublisher;
use fleetops_core::models::{Application, Credential, NotificationTransport, Provider, Resource};
use fleetops_core::orchestration::ExecutionRunner;
use fleetops_core::providers::{
    AdapterError, AdapterResult, BackupRecord, DeploymentFact, ProviderAdapter, ResourceFact,
};
use fleetops_core::registry::AdapterRegistry;
use fleetops_core::storage::{MemoryBackend, Stores};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Programmable adapter: canned discovery output, per-resource snapshot
/// failures, and optional hard failures for whole operations.
#[derive(Debug)]
pub struct MockAdapter {
    name: &'static str,
    facts: Vec<ResourceFact>,
    deployments: Vec<DeploymentFact>,
    failing_snapshots: Vec<String>,
    discovery_error: Option<String>,
    delay: Option<Duration>,
}

impl MockAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            facts: Vec::new(),
            deployments: Vec::new(),
            failing_snapshots: Vec::new(),
            discovery_error: None,
            delay: None,
        }
    }

    pub fn with_facts(mut self, facts: Vec<ResourceFact>) -> Self {
        self.facts = facts;
        self
    }

    pub fn with_deployments(mut self, deployments: Vec<DeploymentFact>) -> Self {
        self.deployments = deployments;
        self
    }

    /// Snapshots of resources with these names report a failed record
    pub fn failing_snapshot(mut self, resource_name: impl Into<String>) -> Self {
        self.failing_snapshots.push(resource_name.into());
        self
    }

    /// Every discovery call (resources and deployments) fails hard
    pub fn failing_discovery(mut self, message: impl Into<String>) -> Self {
        self.discovery_error = Some(message.into());
        self
    }

    /// Every call sleeps this long before responding, for deadline tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    async fn discover(&self, _credential: &Credential) -> AdapterResult<Vec<ResourceFact>> {
        self.simulate_latency().await;
        match &self.discovery_error {
            Some(message) => Err(AdapterError::Protocol(message.clone())),
            None => Ok(self.facts.clone()),
        }
    }

    async fn snapshot(
        &self,
        _credential: &Credential,
        resource: &Resource,
    ) -> AdapterResult<BackupRecord> {
        self.simulate_latency().await;
        if self.failing_snapshots.contains(&resource.name) {
            return Ok(BackupRecord::failed(
                resource.resource_id,
                &resource.name,
                "disk is busy",
            ));
        }
        Ok(BackupRecord::completed(
            resource.resource_id,
            &resource.name,
            format!("snap-{}", resource.name),
            Some(1024),
        ))
    }

    async fn discover_deployments(
        &self,
        _credential: &Credential,
    ) -> AdapterResult<Vec<DeploymentFact>> {
        self.simulate_latency().await;
        match &self.discovery_error {
            Some(message) => Err(AdapterError::Protocol(message.clone())),
            None => Ok(self.deployments.clone()),
        }
    }
}

/// One team's worth of in-memory state plus an empty adapter registry
pub struct TestEnv {
    pub backend: Arc<MemoryBackend>,
    pub stores: Stores,
    pub registry: Arc<AdapterRegistry>,
    pub events: EventPublisher,
    pub team_id: Uuid,
}

impl TestEnv {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let stores = Stores::from_memory(backend.clone());
        Self {
            backend,
            stores,
            registry: Arc::new(AdapterRegistry::new()),
            events: EventPublisher::new(64),
            team_id: Uuid::new_v4(),
        }
    }

    pub fn seed_provider(&self, name: &str) -> Provider {
        self.backend
            .seed_provider(Provider::new(name, name.to_uppercase()))
    }

    pub fn seed_credential(&self, provider: &Provider) -> Credential {
        self.backend.seed_credential(Credential::new(
            self.team_id,
            provider.provider_id,
            json!({ "endpoint": "http://localhost:1" }),
        ))
    }

    pub fn seed_application(&self, name: &str) -> Application {
        self.backend
            .seed_application(Application::new(self.team_id, name))
    }

    pub fn seed_transport(&self, name: &str) -> NotificationTransport {
        self.backend
            .seed_transport(NotificationTransport::new(self.team_id, name, "webhook"))
    }

    pub fn runner(&self) -> ExecutionRunner {
        self.runner_with_timeout(Duration::from_millis(5_000))
    }

    pub fn runner_with_timeout(&self, adapter_timeout: Duration) -> ExecutionRunner {
        ExecutionRunner::new(
            self.stores.clone(),
            self.registry.clone(),
            self.events.clone(),
            adapter_timeout,
        )
    }
}

pub fn resource_fact(id: &str, name: &str) -> ResourceFact {
    ResourceFact {
        provider_resource_id: id.to_string(),
        name: name.to_string(),
        resource_type: "vm".to_string(),
        region: Some("us-east-1".to_string()),
        status: "running".to_string(),
        metadata: json!({}),
    }
}

pub fn deployment_fact(application: &str, asset: &str, environment: &str) -> DeploymentFact {
    DeploymentFact {
        application_name: application.to_string(),
        cloud_asset_id: asset.to_string(),
        environment_name: environment.to_string(),
        kind: "vm".to_string(),
        status: "running".to_string(),
        version: Some("1.0.0".to_string()),
        health_check_url: None,
        metadata: json!({}),
    }
}
