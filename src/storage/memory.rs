//! In-memory backend for embedded use, development, and tests. Natural-key
//! maps give the same atomic upsert semantics as the PostgreSQL unique
//! indexes: the DashMap entry API serializes writers on one key.

use super::{
    ApplicationRegistry, BackupJobStore, CredentialRegistry, DeploymentStore, ExecutionStore,
    NotificationStore, ProviderRegistry, ResourceStore, TransportRegistry, UpsertOutcome,
};
use crate::error::{FleetError, Result};
use crate::models::{
    Application, BackupJob, Credential, Deployment, DeploymentKey, DeploymentPatch, Execution,
    NewBackupJob, NewDeployment, NewExecution, NewNotification, NewResource, Notification,
    NotificationTransport, Provider, Resource,
};
use crate::state_machine::ExecutionState;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

type DeploymentNaturalKey = (Uuid, Uuid, Uuid, String);

#[derive(Default)]
pub struct MemoryBackend {
    executions: DashMap<Uuid, Execution>,
    /// Keyed by `(team_id, provider_resource_id)` so upserts are atomic
    resources: DashMap<(Uuid, String), Resource>,
    /// Keyed by `(team_id, application_id, resource_id, environment_name)`
    deployments: DashMap<DeploymentNaturalKey, Deployment>,
    backup_jobs: DashMap<Uuid, BackupJob>,
    notifications: DashMap<Uuid, Notification>,
    credentials: DashMap<Uuid, Credential>,
    providers: DashMap<Uuid, Provider>,
    applications: DashMap<Uuid, Application>,
    transports: DashMap<Uuid, NotificationTransport>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed externally managed reference data (providers, credentials,
    /// applications, transports); these rows are read-only to the core.
    pub fn seed_provider(&self, provider: Provider) -> Provider {
        self.providers
            .insert(provider.provider_id, provider.clone());
        provider
    }

    pub fn seed_credential(&self, credential: Credential) -> Credential {
        self.credentials
            .insert(credential.credential_id, credential.clone());
        credential
    }

    pub fn seed_application(&self, application: Application) -> Application {
        self.applications
            .insert(application.application_id, application.clone());
        application
    }

    pub fn seed_transport(&self, transport: NotificationTransport) -> NotificationTransport {
        self.transports
            .insert(transport.transport_id, transport.clone());
        transport
    }
}

#[async_trait]
impl ExecutionStore for MemoryBackend {
    async fn create(&self, new: NewExecution) -> Result<Execution> {
        let execution = Execution::from_new(new);
        self.executions
            .insert(execution.execution_id, execution.clone());
        Ok(execution)
    }

    async fn get(&self, execution_id: Uuid) -> Result<Option<Execution>> {
        Ok(self.executions.get(&execution_id).map(|e| e.clone()))
    }

    async fn transition(
        &self,
        execution_id: Uuid,
        next: ExecutionState,
        error_message: Option<String>,
        result: Option<Value>,
    ) -> Result<Execution> {
        // get_mut holds the shard lock for this entry, serializing all
        // writers of one execution row
        let mut entry = self.executions.get_mut(&execution_id).ok_or_else(|| {
            FleetError::DatabaseError(format!("execution {execution_id} not found"))
        })?;

        if !entry.state.can_transition_to(next) {
            return Err(FleetError::StateTransitionError(format!(
                "execution {execution_id} cannot move from {} to {next}",
                entry.state
            )));
        }

        entry.state = next;
        if error_message.is_some() {
            entry.error_message = error_message;
        }
        if result.is_some() {
            entry.result = result;
        }
        let now = Utc::now();
        if next.is_active() {
            entry.started_at = Some(now);
        }
        if next.is_terminal() {
            entry.finished_at = Some(now);
        }
        Ok(entry.clone())
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Execution>> {
        Ok(self
            .executions
            .iter()
            .filter(|e| e.team_id == team_id)
            .map(|e| e.clone())
            .collect())
    }
}

#[async_trait]
impl ResourceStore for MemoryBackend {
    async fn upsert(&self, new: NewResource) -> Result<UpsertOutcome<Resource>> {
        let key = (new.team_id, new.provider_resource_id.clone());
        match self.resources.entry(key) {
            dashmap::Entry::Occupied(mut occupied) => {
                let resource = occupied.get_mut();
                resource.name = new.name;
                resource.resource_type = new.resource_type;
                resource.region = new.region;
                resource.status = new.status;
                resource.metadata = new.metadata;
                let now = Utc::now();
                resource.last_scanned_at = Some(now);
                resource.updated_at = now;
                Ok(UpsertOutcome::Updated(resource.clone()))
            }
            dashmap::Entry::Vacant(vacant) => {
                let resource = Resource::from_new(new);
                vacant.insert(resource.clone());
                Ok(UpsertOutcome::Created(resource))
            }
        }
    }

    async fn find_or_create(&self, seed: NewResource) -> Result<Resource> {
        let key = (seed.team_id, seed.provider_resource_id.clone());
        let entry = self
            .resources
            .entry(key)
            .or_insert_with(|| Resource::from_new(seed));
        Ok(entry.clone())
    }

    async fn get(&self, resource_id: Uuid) -> Result<Option<Resource>> {
        Ok(self
            .resources
            .iter()
            .find(|r| r.resource_id == resource_id)
            .map(|r| r.clone()))
    }

    async fn list_for_provider(&self, team_id: Uuid, provider_id: Uuid) -> Result<Vec<Resource>> {
        Ok(self
            .resources
            .iter()
            .filter(|r| r.team_id == team_id && r.provider_id == provider_id)
            .map(|r| r.clone())
            .collect())
    }
}

#[async_trait]
impl DeploymentStore for MemoryBackend {
    async fn upsert(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
        kind: &str,
        patch: DeploymentPatch,
    ) -> Result<UpsertOutcome<Deployment>> {
        let map_key = (
            team_id,
            key.application_id,
            key.resource_id,
            key.environment_name.clone(),
        );
        match self.deployments.entry(map_key) {
            dashmap::Entry::Occupied(mut occupied) => {
                occupied.get_mut().apply_patch(patch);
                Ok(UpsertOutcome::Updated(occupied.get().clone()))
            }
            dashmap::Entry::Vacant(vacant) => {
                let deployment = Deployment::from_new(NewDeployment {
                    team_id,
                    application_id: key.application_id,
                    resource_id: key.resource_id,
                    environment_name: key.environment_name.clone(),
                    kind: kind.to_string(),
                    status: patch.status,
                    version: patch.version,
                    health_check_url: patch.health_check_url,
                    metadata: patch.metadata,
                });
                vacant.insert(deployment.clone());
                Ok(UpsertOutcome::Created(deployment))
            }
        }
    }

    async fn find_by_natural_key(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
    ) -> Result<Option<Deployment>> {
        let map_key = (
            team_id,
            key.application_id,
            key.resource_id,
            key.environment_name.clone(),
        );
        Ok(self.deployments.get(&map_key).map(|d| d.clone()))
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Deployment>> {
        Ok(self
            .deployments
            .iter()
            .filter(|d| d.team_id == team_id)
            .map(|d| d.clone())
            .collect())
    }
}

#[async_trait]
impl BackupJobStore for MemoryBackend {
    async fn create(&self, new: NewBackupJob) -> Result<BackupJob> {
        let job = BackupJob::from_new(new);
        self.backup_jobs.insert(job.backup_job_id, job.clone());
        Ok(job)
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<BackupJob>> {
        Ok(self
            .backup_jobs
            .iter()
            .filter(|j| j.team_id == team_id)
            .map(|j| j.clone())
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryBackend {
    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification::from_new(new);
        self.notifications
            .insert(notification.notification_id, notification.clone());
        Ok(notification)
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.team_id == team_id)
            .map(|n| n.clone())
            .collect())
    }
}

#[async_trait]
impl CredentialRegistry for MemoryBackend {
    async fn get(&self, team_id: Uuid, provider_id: Uuid) -> Result<Option<Credential>> {
        Ok(self
            .credentials
            .iter()
            .find(|c| c.team_id == team_id && c.provider_id == provider_id && c.active)
            .map(|c| c.clone()))
    }

    async fn list_active(&self, team_id: Uuid) -> Result<Vec<Credential>> {
        Ok(self
            .credentials
            .iter()
            .filter(|c| c.team_id == team_id && c.active)
            .map(|c| c.clone())
            .collect())
    }
}

#[async_trait]
impl ProviderRegistry for MemoryBackend {
    async fn get(&self, provider_id: Uuid) -> Result<Option<Provider>> {
        Ok(self.providers.get(&provider_id).map(|p| p.clone()))
    }
}

#[async_trait]
impl ApplicationRegistry for MemoryBackend {
    async fn find_by_name(&self, team_id: Uuid, name: &str) -> Result<Option<Application>> {
        Ok(self
            .applications
            .iter()
            .find(|a| a.team_id == team_id && a.name == name)
            .map(|a| a.clone()))
    }
}

#[async_trait]
impl TransportRegistry for MemoryBackend {
    async fn list_active(&self, team_id: Uuid) -> Result<Vec<NotificationTransport>> {
        Ok(self
            .transports
            .iter()
            .filter(|t| t.team_id == team_id && t.active)
            .map(|t| t.clone())
            .collect())
    }
}
