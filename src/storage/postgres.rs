//! PostgreSQL backend. Natural-key uniqueness is enforced by unique indexes
//! and every catalog write is an `INSERT ... ON CONFLICT ... DO UPDATE`, so
//! concurrent writers on the same row can never duplicate it or lose an
//! update. Ledger transitions compare-and-swap on the observed state.

use super::{
    ApplicationRegistry, BackupJobStore, CredentialRegistry, DeploymentStore, ExecutionStore,
    NotificationStore, ProviderRegistry, ResourceStore, UpsertOutcome,
};
use crate::error::{FleetError, Result};
use crate::models::{
    Application, BackupJob, BackupStatus, Credential, Deployment, DeploymentKey, DeploymentPatch,
    Execution, NewBackupJob, NewExecution, NewNotification, NewResource, Notification,
    NotificationKind, NotificationTransport, Provider, Resource, TaskType,
};
use crate::state_machine::ExecutionState;
use crate::storage::TransportRegistry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Schema statements executed by [`PgStore::migrate`]; idempotent so the
/// server can run them on every boot.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_providers (
        provider_id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_credentials (
        credential_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        provider_id UUID NOT NULL REFERENCES fleetops_providers (provider_id),
        config JSONB NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_applications (
        application_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        UNIQUE (team_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_transports (
        transport_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        name TEXT NOT NULL,
        transport_type TEXT NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        config JSONB NOT NULL DEFAULT 'null'::jsonb
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_executions (
        execution_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        provider_id UUID NOT NULL,
        task_type TEXT NOT NULL,
        state TEXT NOT NULL,
        error_message TEXT,
        result JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        started_at TIMESTAMPTZ,
        finished_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_resources (
        resource_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        provider_id UUID NOT NULL,
        provider_resource_id TEXT NOT NULL,
        name TEXT NOT NULL,
        resource_type TEXT NOT NULL,
        region TEXT,
        status TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        last_scanned_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (team_id, provider_resource_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_deployments (
        deployment_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        application_id UUID NOT NULL,
        resource_id UUID NOT NULL,
        environment_name TEXT NOT NULL,
        kind TEXT NOT NULL,
        status TEXT NOT NULL,
        version TEXT,
        health_check_url TEXT,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (team_id, application_id, resource_id, environment_name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_backup_jobs (
        backup_job_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        resource_id UUID NOT NULL,
        backup_id TEXT NOT NULL,
        size_bytes BIGINT,
        status TEXT NOT NULL,
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fleetops_notifications (
        notification_id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        transport_id UUID NOT NULL,
        kind TEXT NOT NULL,
        message TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the idempotent schema
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn parse_column<T>(value: &str, column: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| FleetError::DatabaseError(format!("corrupt {column} column: {e}")))
}

#[derive(Debug, FromRow)]
struct ExecutionRow {
    execution_id: Uuid,
    team_id: Uuid,
    provider_id: Uuid,
    task_type: String,
    state: String,
    error_message: Option<String>,
    result: Option<Value>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRow {
    fn into_model(self) -> Result<Execution> {
        Ok(Execution {
            execution_id: self.execution_id,
            team_id: self.team_id,
            provider_id: self.provider_id,
            task_type: parse_column::<TaskType>(&self.task_type, "task_type")?,
            state: parse_column::<ExecutionState>(&self.state, "state")?,
            error_message: self.error_message,
            result: self.result,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    resource_id: Uuid,
    team_id: Uuid,
    provider_id: Uuid,
    provider_resource_id: String,
    name: String,
    resource_type: String,
    region: Option<String>,
    status: String,
    metadata: Value,
    last_scanned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Populated by `(xmax = 0) AS inserted` on upsert queries
    #[sqlx(default)]
    inserted: Option<bool>,
}

impl ResourceRow {
    fn into_model(self) -> Resource {
        Resource {
            resource_id: self.resource_id,
            team_id: self.team_id,
            provider_id: self.provider_id,
            provider_resource_id: self.provider_resource_id,
            name: self.name,
            resource_type: self.resource_type,
            region: self.region,
            status: self.status,
            metadata: self.metadata,
            last_scanned_at: self.last_scanned_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DeploymentRow {
    deployment_id: Uuid,
    team_id: Uuid,
    application_id: Uuid,
    resource_id: Uuid,
    environment_name: String,
    kind: String,
    status: String,
    version: Option<String>,
    health_check_url: Option<String>,
    metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    inserted: Option<bool>,
}

impl DeploymentRow {
    fn into_model(self) -> Deployment {
        Deployment {
            deployment_id: self.deployment_id,
            team_id: self.team_id,
            application_id: self.application_id,
            resource_id: self.resource_id,
            environment_name: self.environment_name,
            kind: self.kind,
            status: self.status,
            version: self.version,
            health_check_url: self.health_check_url,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BackupJobRow {
    backup_job_id: Uuid,
    team_id: Uuid,
    resource_id: Uuid,
    backup_id: String,
    size_bytes: Option<i64>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl BackupJobRow {
    fn into_model(self) -> Result<BackupJob> {
        Ok(BackupJob {
            backup_job_id: self.backup_job_id,
            team_id: self.team_id,
            resource_id: self.resource_id,
            backup_id: self.backup_id,
            size_bytes: self.size_bytes,
            status: parse_column::<BackupStatus>(&self.status, "status")?,
            error_message: self.error_message,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    notification_id: Uuid,
    team_id: Uuid,
    transport_id: Uuid,
    kind: String,
    message: String,
    metadata: Value,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_model(self) -> Result<Notification> {
        Ok(Notification {
            notification_id: self.notification_id,
            team_id: self.team_id,
            transport_id: self.transport_id,
            kind: parse_column::<NotificationKind>(&self.kind, "kind")?,
            message: self.message,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl ExecutionStore for PgStore {
    async fn create(&self, new: NewExecution) -> Result<Execution> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            r#"
            INSERT INTO fleetops_executions (execution_id, team_id, provider_id, task_type, state)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.team_id)
        .bind(new.provider_id)
        .bind(new.task_type.to_string())
        .fetch_one(&self.pool)
        .await?;
        row.into_model()
    }

    async fn get(&self, execution_id: Uuid) -> Result<Option<Execution>> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            "SELECT * FROM fleetops_executions WHERE execution_id = $1",
        )
        .bind(execution_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ExecutionRow::into_model).transpose()
    }

    async fn transition(
        &self,
        execution_id: Uuid,
        next: ExecutionState,
        error_message: Option<String>,
        result: Option<Value>,
    ) -> Result<Execution> {
        let current = ExecutionStore::get(self, execution_id).await?.ok_or_else(|| {
            FleetError::DatabaseError(format!("execution {execution_id} not found"))
        })?;

        if !current.state.can_transition_to(next) {
            return Err(FleetError::StateTransitionError(format!(
                "execution {execution_id} cannot move from {} to {next}",
                current.state
            )));
        }

        // Compare-and-swap on the observed state: a concurrent transition
        // makes this update match zero rows
        let row = sqlx::query_as::<_, ExecutionRow>(
            r#"
            UPDATE fleetops_executions
            SET
                state = $2,
                error_message = COALESCE($3, error_message),
                result = COALESCE($4, result),
                started_at = CASE WHEN $2 = 'running' THEN now() ELSE started_at END,
                finished_at = CASE WHEN $2 IN ('completed', 'failed') THEN now() ELSE finished_at END
            WHERE execution_id = $1 AND state = $5
            RETURNING *
            "#,
        )
        .bind(execution_id)
        .bind(next.to_string())
        .bind(error_message)
        .bind(result)
        .bind(current.state.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_model(),
            None => Err(FleetError::StateTransitionError(format!(
                "execution {execution_id} was transitioned concurrently"
            ))),
        }
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Execution>> {
        let rows = sqlx::query_as::<_, ExecutionRow>(
            "SELECT * FROM fleetops_executions WHERE team_id = $1 ORDER BY created_at DESC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ExecutionRow::into_model).collect()
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn upsert(&self, new: NewResource) -> Result<UpsertOutcome<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            INSERT INTO fleetops_resources
                (resource_id, team_id, provider_id, provider_resource_id, name,
                 resource_type, region, status, metadata, last_scanned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (team_id, provider_resource_id) DO UPDATE SET
                name = EXCLUDED.name,
                resource_type = EXCLUDED.resource_type,
                region = EXCLUDED.region,
                status = EXCLUDED.status,
                metadata = EXCLUDED.metadata,
                last_scanned_at = now(),
                updated_at = now()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.team_id)
        .bind(new.provider_id)
        .bind(&new.provider_resource_id)
        .bind(&new.name)
        .bind(&new.resource_type)
        .bind(&new.region)
        .bind(&new.status)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await?;

        let created = row.inserted.unwrap_or(false);
        let resource = row.into_model();
        Ok(if created {
            UpsertOutcome::Created(resource)
        } else {
            UpsertOutcome::Updated(resource)
        })
    }

    async fn find_or_create(&self, seed: NewResource) -> Result<Resource> {
        // The no-op conflict update lets one statement return the existing
        // row without rewriting scan-owned fields
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            INSERT INTO fleetops_resources
                (resource_id, team_id, provider_id, provider_resource_id, name,
                 resource_type, region, status, metadata, last_scanned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (team_id, provider_resource_id) DO UPDATE SET
                team_id = EXCLUDED.team_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seed.team_id)
        .bind(seed.provider_id)
        .bind(&seed.provider_resource_id)
        .bind(&seed.name)
        .bind(&seed.resource_type)
        .bind(&seed.region)
        .bind(&seed.status)
        .bind(&seed.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_model())
    }

    async fn get(&self, resource_id: Uuid) -> Result<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            "SELECT * FROM fleetops_resources WHERE resource_id = $1",
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ResourceRow::into_model))
    }

    async fn list_for_provider(&self, team_id: Uuid, provider_id: Uuid) -> Result<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT * FROM fleetops_resources
            WHERE team_id = $1 AND provider_id = $2
            ORDER BY name
            "#,
        )
        .bind(team_id)
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ResourceRow::into_model).collect())
    }
}

#[async_trait]
impl DeploymentStore for PgStore {
    async fn upsert(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
        kind: &str,
        patch: DeploymentPatch,
    ) -> Result<UpsertOutcome<Deployment>> {
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            INSERT INTO fleetops_deployments
                (deployment_id, team_id, application_id, resource_id, environment_name,
                 kind, status, version, health_check_url, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (team_id, application_id, resource_id, environment_name) DO UPDATE SET
                status = EXCLUDED.status,
                version = EXCLUDED.version,
                health_check_url = EXCLUDED.health_check_url,
                metadata = EXCLUDED.metadata,
                updated_at = now()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(key.application_id)
        .bind(key.resource_id)
        .bind(&key.environment_name)
        .bind(kind)
        .bind(&patch.status)
        .bind(&patch.version)
        .bind(&patch.health_check_url)
        .bind(&patch.metadata)
        .fetch_one(&self.pool)
        .await?;

        let created = row.inserted.unwrap_or(false);
        let deployment = row.into_model();
        Ok(if created {
            UpsertOutcome::Created(deployment)
        } else {
            UpsertOutcome::Updated(deployment)
        })
    }

    async fn find_by_natural_key(
        &self,
        team_id: Uuid,
        key: &DeploymentKey,
    ) -> Result<Option<Deployment>> {
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            SELECT * FROM fleetops_deployments
            WHERE team_id = $1 AND application_id = $2
              AND resource_id = $3 AND environment_name = $4
            "#,
        )
        .bind(team_id)
        .bind(key.application_id)
        .bind(key.resource_id)
        .bind(&key.environment_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DeploymentRow::into_model))
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Deployment>> {
        let rows = sqlx::query_as::<_, DeploymentRow>(
            "SELECT * FROM fleetops_deployments WHERE team_id = $1 ORDER BY updated_at DESC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DeploymentRow::into_model).collect())
    }
}

#[async_trait]
impl BackupJobStore for PgStore {
    async fn create(&self, new: NewBackupJob) -> Result<BackupJob> {
        let row = sqlx::query_as::<_, BackupJobRow>(
            r#"
            INSERT INTO fleetops_backup_jobs
                (backup_job_id, team_id, resource_id, backup_id, size_bytes, status, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.team_id)
        .bind(new.resource_id)
        .bind(&new.backup_id)
        .bind(new.size_bytes)
        .bind(new.status.to_string())
        .bind(&new.error_message)
        .fetch_one(&self.pool)
        .await?;
        row.into_model()
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<BackupJob>> {
        let rows = sqlx::query_as::<_, BackupJobRow>(
            "SELECT * FROM fleetops_backup_jobs WHERE team_id = $1 ORDER BY created_at DESC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BackupJobRow::into_model).collect()
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO fleetops_notifications
                (notification_id, team_id, transport_id, kind, message, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.team_id)
        .bind(new.transport_id)
        .bind(new.kind.to_string())
        .bind(&new.message)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await?;
        row.into_model()
    }

    async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM fleetops_notifications WHERE team_id = $1 ORDER BY created_at DESC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(NotificationRow::into_model).collect()
    }
}

#[async_trait]
impl CredentialRegistry for PgStore {
    async fn get(&self, team_id: Uuid, provider_id: Uuid) -> Result<Option<Credential>> {
        let credential = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Value, bool)>(
            r#"
            SELECT credential_id, team_id, provider_id, config, active
            FROM fleetops_credentials
            WHERE team_id = $1 AND provider_id = $2 AND active
            LIMIT 1
            "#,
        )
        .bind(team_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credential.map(|(credential_id, team_id, provider_id, config, active)| Credential {
            credential_id,
            team_id,
            provider_id,
            config,
            active,
        }))
    }

    async fn list_active(&self, team_id: Uuid) -> Result<Vec<Credential>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Value, bool)>(
            r#"
            SELECT credential_id, team_id, provider_id, config, active
            FROM fleetops_credentials
            WHERE team_id = $1 AND active
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(credential_id, team_id, provider_id, config, active)| Credential {
                credential_id,
                team_id,
                provider_id,
                config,
                active,
            })
            .collect())
    }
}

#[async_trait]
impl ProviderRegistry for PgStore {
    async fn get(&self, provider_id: Uuid) -> Result<Option<Provider>> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT provider_id, name, display_name FROM fleetops_providers WHERE provider_id = $1",
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(provider_id, name, display_name)| Provider {
            provider_id,
            name,
            display_name,
        }))
    }
}

#[async_trait]
impl ApplicationRegistry for PgStore {
    async fn find_by_name(&self, team_id: Uuid, name: &str) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, Option<String>)>(
            r#"
            SELECT application_id, team_id, name, description
            FROM fleetops_applications
            WHERE team_id = $1 AND name = $2
            "#,
        )
        .bind(team_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(application_id, team_id, name, description)| Application {
            application_id,
            team_id,
            name,
            description,
        }))
    }
}

#[async_trait]
impl TransportRegistry for PgStore {
    async fn list_active(&self, team_id: Uuid) -> Result<Vec<NotificationTransport>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, bool, Value)>(
            r#"
            SELECT transport_id, team_id, name, transport_type, active, config
            FROM fleetops_transports
            WHERE team_id = $1 AND active
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(
                |(transport_id, team_id, name, transport_type, active, config)| {
                    NotificationTransport {
                        transport_id,
                        team_id,
                        name,
                        transport_type,
                        active,
                        config,
                    }
                },
            )
            .collect())
    }
}
