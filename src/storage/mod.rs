//! # Persistence Layer
//!
//! Store traits for the execution ledger, resource catalog, deployment
//! catalog, and audit rows, plus the read-only collaborator registries
//! (credentials, providers, applications, transports).
//!
//! Two backends are provided: an in-memory backend (embedded, development,
//! tests) and a PostgreSQL backend behind the `postgres` feature. Both
//! express catalog writes as atomic natural-key upserts so concurrent
//! writers on the same row never lose updates or hit duplicate keys.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryBackend;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

use crate::error::Result;
use crate::models::{
    Application, BackupJob, Credential, Deployment, DeploymentKey, DeploymentPatch, Execution,
    NewBackupJob, NewExecution, NewNotification, NewResource, Notification, NotificationTransport,
    Provider, Resource,
};
use crate::state_machine::ExecutionState;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Result of an atomic insert-or-update against a natural key
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<T> {
    Created(T),
    Updated(T),
}

impl<T> UpsertOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Updated(value) => value,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Durable record of every orchestration attempt. Append-only: rows are
/// created once, mutated only through guarded state transitions, and never
/// deleted.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn create(&self, new: NewExecution) -> Result<Execution>;

    async fn get(&self, execution_id: Uuid) -> Result<Option<Execution>>;

    /// Guarded state transition. Rejects any move the state machine does not
    /// allow and any concurrent mutation of the same row (compare-and-swap
    /// on the observed state).
    async fn transition(
        &self,
        execution_id: Uuid,
        next: ExecutionState,
        error_message: Option<String>,
        result: Option<Value>,
    ) -> Result<Execution>;

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Execution>>;
}

/// Resource catalog keyed by `(team_id, provider_resource_id)`
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Atomic insert-or-update for one discovery fact
    async fn upsert(&self, new: NewResource) -> Result<UpsertOutcome<Resource>>;

    /// Resolve the catalog row for an external asset, creating it from the
    /// seed when missing
    async fn find_or_create(&self, seed: NewResource) -> Result<Resource>;

    async fn get(&self, resource_id: Uuid) -> Result<Option<Resource>>;

    async fn list_for_provider(&self, team_id: Uuid, provider_id: Uuid) -> Result<Vec<Resource>>;
}

/// Deployment catalog keyed by `(application_id, resource_id, environment_name)`
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Atomic insert-or-update against the natural key. Updates rewrite only
    /// the mutable fields carried by the patch.
    async fn upsert(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
        kind: &str,
        patch: DeploymentPatch,
    ) -> Result<UpsertOutcome<Deployment>>;

    async fn find_by_natural_key(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
    ) -> Result<Option<Deployment>>;

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Deployment>>;
}

#[async_trait]
pub trait BackupJobStore: Send + Sync {
    async fn create(&self, new: NewBackupJob) -> Result<BackupJob>;

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<BackupJob>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, new: NewNotification) -> Result<Notification>;

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Notification>>;
}

/// Read-only credential lookup; credential rows are externally managed
#[async_trait]
pub trait CredentialRegistry: Send + Sync {
    async fn get(&self, team_id: Uuid, provider_id: Uuid) -> Result<Option<Credential>>;

    async fn list_active(&self, team_id: Uuid) -> Result<Vec<Credential>>;
}

/// Read-only provider reference data; executions and credentials reference
/// providers by id, so id lookup is the only operation needed
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    async fn get(&self, provider_id: Uuid) -> Result<Option<Provider>>;
}

/// Read-only application lookup for deployment reconciliation
#[async_trait]
pub trait ApplicationRegistry: Send + Sync {
    async fn find_by_name(&self, team_id: Uuid, name: &str) -> Result<Option<Application>>;
}

/// Read-only transport lookup for notification fan-out
#[async_trait]
pub trait TransportRegistry: Send + Sync {
    async fn list_active(&self, team_id: Uuid) -> Result<Vec<NotificationTransport>>;
}

/// Bundle of every store handle the orchestrator and reconciler consume
#[derive(Clone)]
pub struct Stores {
    pub executions: Arc<dyn ExecutionStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub deployments: Arc<dyn DeploymentStore>,
    pub backup_jobs: Arc<dyn BackupJobStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub credentials: Arc<dyn CredentialRegistry>,
    pub providers: Arc<dyn ProviderRegistry>,
    pub applications: Arc<dyn ApplicationRegistry>,
    pub transports: Arc<dyn TransportRegistry>,
}

impl Stores {
    /// Wire every store to one shared in-memory backend
    pub fn from_memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            executions: backend.clone(),
            resources: backend.clone(),
            deployments: backend.clone(),
            backup_jobs: backend.clone(),
            notifications: backend.clone(),
            credentials: backend.clone(),
            providers: backend.clone(),
            applications: backend.clone(),
            transports: backend,
        }
    }

    /// Wire every store to one shared PostgreSQL pool
    #[cfg(feature = "postgres")]
    pub fn from_postgres(store: Arc<PgStore>) -> Self {
        Self {
            executions: store.clone(),
            resources: store.clone(),
            deployments: store.clone(),
            backup_jobs: store.clone(),
            notifications: store.clone(),
            credentials: store.clone(),
            providers: store.clone(),
            applications: store.clone(),
            transports: store,
        }
    }
}
