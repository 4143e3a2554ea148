//! # Execution Runner
//!
//! Drives one ledger execution from `running` to its terminal state:
//! resolves credential and provider, dispatches to the matching adapter,
//! persists results, and always finishes with notification fan-out.
//!
//! Error scoping follows the ledger contract: anything that blocks the whole
//! run (missing credential, unsupported provider, adapter failure, timeout)
//! fails the execution once; anything scoped to a single item (one fact, one
//! resource) is folded into the aggregate result and processing continues.

use super::types::{BackupSummary, InventorySummary};
use crate::constants::events;
use crate::error::{FleetError, Result};
use crate::events::EventPublisher;
use crate::models::{
    BackupStatus, Credential, Execution, NewBackupJob, NewResource, NotificationKind, Provider,
    TaskType,
};
use crate::notifications::NotificationFanout;
use crate::providers::{BackupRecord, ProviderAdapter};
use crate::registry::AdapterRegistry;
use crate::state_machine::ExecutionState;
use crate::storage::Stores;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct ExecutionRunner {
    stores: Stores,
    registry: Arc<AdapterRegistry>,
    fanout: NotificationFanout,
    events: EventPublisher,
    adapter_timeout: Duration,
}

impl ExecutionRunner {
    pub fn new(
        stores: Stores,
        registry: Arc<AdapterRegistry>,
        events: EventPublisher,
        adapter_timeout: Duration,
    ) -> Self {
        let fanout = NotificationFanout::new(
            stores.transports.clone(),
            stores.notifications.clone(),
        );
        Self {
            stores,
            registry,
            fanout,
            events,
            adapter_timeout,
        }
    }

    /// Process one submitted execution end to end. Never returns an error:
    /// every outcome is recorded on the ledger and, except for a failed
    /// `running` transition, ends in notification fan-out.
    pub async fn run(&self, execution_id: Uuid) {
        let execution = match self
            .stores
            .executions
            .transition(execution_id, ExecutionState::Running, None, None)
            .await
        {
            Ok(execution) => execution,
            Err(e) => {
                // Without a persisted `running` transition the attempt is
                // abandoned; the ledger keeps whatever state it reported
                error!(execution_id = %execution_id, error = %e, "❌ Could not start execution");
                return;
            }
        };
        self.events.publish(
            events::EXECUTION_STARTED,
            json!({ "execution_id": execution_id, "task_type": execution.task_type }),
        );

        match self.dispatch(&execution).await {
            Ok((result, summary)) => {
                self.finish(
                    &execution,
                    ExecutionState::Completed,
                    None,
                    Some(result.clone()),
                )
                .await;
                info!(
                    execution_id = %execution_id,
                    task_type = %execution.task_type,
                    "✅ Execution completed"
                );
                self.fanout
                    .notify(
                        execution.team_id,
                        NotificationKind::Success,
                        &summary,
                        json!({ "execution_id": execution_id, "result": result }),
                    )
                    .await;
            }
            Err(e) => {
                let message = e.to_string();
                self.finish(&execution, ExecutionState::Failed, Some(message.clone()), None)
                    .await;
                warn!(
                    execution_id = %execution_id,
                    task_type = %execution.task_type,
                    error = %message,
                    "❌ Execution failed"
                );
                self.fanout
                    .notify(
                        execution.team_id,
                        NotificationKind::Failure,
                        &format!("{} task failed: {message}", execution.task_type),
                        json!({ "execution_id": execution_id, "error": message }),
                    )
                    .await;
            }
        }
    }

    async fn finish(
        &self,
        execution: &Execution,
        state: ExecutionState,
        error_message: Option<String>,
        result: Option<Value>,
    ) {
        if let Err(e) = self
            .stores
            .executions
            .transition(execution.execution_id, state, error_message, result)
            .await
        {
            error!(
                execution_id = %execution.execution_id,
                error = %e,
                "Could not persist terminal state"
            );
        }
        let event = match state {
            ExecutionState::Completed => events::EXECUTION_COMPLETED,
            _ => events::EXECUTION_FAILED,
        };
        self.events.publish(
            event,
            json!({ "execution_id": execution.execution_id, "state": state }),
        );
    }

    /// Resolve collaborators and run the task-type specific logic, returning
    /// the aggregate result payload and a human-readable summary
    async fn dispatch(&self, execution: &Execution) -> Result<(Value, String)> {
        let credential = self
            .stores
            .credentials
            .get(execution.team_id, execution.provider_id)
            .await?
            .ok_or_else(|| {
                FleetError::CredentialNotFound(format!(
                    "no active credential for team {} and provider {}",
                    execution.team_id, execution.provider_id
                ))
            })?;
        let provider = self
            .stores
            .providers
            .get(execution.provider_id)
            .await?
            .ok_or_else(|| {
                FleetError::ProviderNotFound(format!("provider {}", execution.provider_id))
            })?;
        let adapter = self.registry.resolve(&provider.name)?;

        match execution.task_type {
            TaskType::Inventory => self.run_inventory(execution, &credential, adapter).await,
            TaskType::Backup => {
                self.run_backup(execution, &credential, &provider, adapter)
                    .await
            }
        }
    }

    /// Apply the configured deadline to one adapter call
    async fn with_deadline<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, crate::providers::AdapterError>>,
    {
        match tokio::time::timeout(self.adapter_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(FleetError::AdapterError(e.to_string())),
            Err(_) => Err(FleetError::AdapterError(format!(
                "{operation} timed out after {}ms",
                self.adapter_timeout.as_millis()
            ))),
        }
    }

    async fn run_inventory(
        &self,
        execution: &Execution,
        credential: &Credential,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Result<(Value, String)> {
        let facts = self
            .with_deadline("discovery", adapter.discover(credential))
            .await?;

        let mut summary = InventorySummary {
            discovered: facts.len(),
            ..Default::default()
        };
        for fact in facts {
            let outcome = self
                .stores
                .resources
                .upsert(NewResource {
                    team_id: execution.team_id,
                    provider_id: execution.provider_id,
                    provider_resource_id: fact.provider_resource_id.clone(),
                    name: fact.name.clone(),
                    resource_type: fact.resource_type.clone(),
                    region: fact.region.clone(),
                    status: fact.status.clone(),
                    metadata: fact.metadata.clone(),
                })
                .await;
            match outcome {
                Ok(outcome) if outcome.was_created() => summary.created += 1,
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    // Per-fact persistence errors never abort the run
                    warn!(
                        execution_id = %execution.execution_id,
                        provider_resource_id = %fact.provider_resource_id,
                        error = %e,
                        "Failed to persist discovered resource; skipping"
                    );
                    summary.failed += 1;
                }
            }
            summary.facts.push(fact);
        }

        let message = summary.message();
        Ok((serde_json::to_value(summary)?, message))
    }

    async fn run_backup(
        &self,
        execution: &Execution,
        credential: &Credential,
        provider: &Provider,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Result<(Value, String)> {
        let resources = self
            .stores
            .resources
            .list_for_provider(execution.team_id, execution.provider_id)
            .await?;

        let mut summary = BackupSummary {
            total: resources.len(),
            ..Default::default()
        };
        for resource in &resources {
            // Each attempt is independent; one failing resource never
            // short-circuits the loop
            let record = match self
                .with_deadline("snapshot", adapter.snapshot(credential, resource))
                .await
            {
                Ok(record) => record,
                Err(e) => BackupRecord::failed(resource.resource_id, &resource.name, e.to_string()),
            };

            match record.status {
                BackupStatus::Completed => {
                    summary.succeeded += 1;
                    let audit = self
                        .stores
                        .backup_jobs
                        .create(NewBackupJob {
                            team_id: execution.team_id,
                            resource_id: record.resource_id,
                            backup_id: record.backup_id.clone().unwrap_or_default(),
                            size_bytes: record.size_bytes,
                            status: record.status,
                            error_message: None,
                        })
                        .await;
                    if let Err(e) = audit {
                        warn!(
                            execution_id = %execution.execution_id,
                            resource = %resource.name,
                            error = %e,
                            "Failed to record backup job audit row"
                        );
                    }
                }
                BackupStatus::Failed => {
                    warn!(
                        execution_id = %execution.execution_id,
                        provider = %provider.name,
                        resource = %resource.name,
                        error = record.error_message.as_deref().unwrap_or("unknown"),
                        "Snapshot failed for resource; continuing"
                    );
                    summary.failed += 1;
                }
            }
            summary.records.push(record);
        }

        let message = summary.message();
        Ok((serde_json::to_value(summary)?, message))
    }
}
