use crate::constants::events;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::models::{Credential, DeploymentKey, DeploymentPatch, NewResource};
use crate::providers::DeploymentFact;
use crate::registry::AdapterRegistry;
use crate::storage::{Stores, UpsertOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Aggregate counters returned by one reconciliation run, plus the full
/// discovery set for observability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    pub discoveries: Vec<DeploymentFact>,
}

impl ReconciliationReport {
    pub fn message(&self) -> String {
        format!(
            "reconciliation finished: created={} updated={} errors={}",
            self.created, self.updated, self.errors
        )
    }
}

/// Merges freshly discovered deployment facts into the catalog. Runs
/// independently of the task orchestrator and never aborts early: errors
/// are scoped to the failing provider or fact and counted.
pub struct DiscoveryReconciler {
    stores: Stores,
    registry: Arc<AdapterRegistry>,
    events: EventPublisher,
}

impl DiscoveryReconciler {
    pub fn new(stores: Stores, registry: Arc<AdapterRegistry>, events: EventPublisher) -> Self {
        Self {
            stores,
            registry,
            events,
        }
    }

    /// Reconcile one team's deployment catalog against its discovery
    /// sources, optionally scoped to a single provider family.
    pub async fn reconcile(
        &self,
        team_id: Uuid,
        provider_scope: Option<&str>,
    ) -> Result<ReconciliationReport> {
        let credentials = self.stores.credentials.list_active(team_id).await?;
        let mut report = ReconciliationReport::default();

        for credential in credentials {
            let provider = match self.stores.providers.get(credential.provider_id).await {
                Ok(Some(provider)) => provider,
                Ok(None) => {
                    warn!(
                        team_id = %team_id,
                        provider_id = %credential.provider_id,
                        "Credential references unknown provider; skipping"
                    );
                    report.errors += 1;
                    continue;
                }
                Err(e) => {
                    warn!(team_id = %team_id, error = %e, "Provider lookup failed; skipping");
                    report.errors += 1;
                    continue;
                }
            };

            if let Some(scope) = provider_scope {
                if provider.name != scope {
                    continue;
                }
            }

            let adapter = match self.registry.resolve(&provider.name) {
                Ok(adapter) => adapter,
                Err(e) => {
                    warn!(provider = %provider.name, error = %e, "No discovery source; skipping");
                    report.errors += 1;
                    continue;
                }
            };

            // A discovery failure is scoped to this provider; the remaining
            // providers still reconcile
            let facts = match adapter.discover_deployments(&credential).await {
                Ok(facts) => facts,
                Err(e) => {
                    warn!(
                        team_id = %team_id,
                        provider = %provider.name,
                        error = %e,
                        "Deployment discovery failed for provider; skipping"
                    );
                    report.errors += 1;
                    continue;
                }
            };

            debug!(
                team_id = %team_id,
                provider = %provider.name,
                facts = facts.len(),
                "Deployment discovery finished"
            );

            for fact in facts {
                match self.apply_fact(team_id, &credential, &fact).await {
                    Ok(Some(outcome)) => {
                        if outcome.was_created() {
                            report.created += 1;
                        } else {
                            report.updated += 1;
                        }
                    }
                    Ok(None) => {
                        // Deployments only attach to pre-registered
                        // applications; unknown names are skipped, not errors
                        debug!(
                            team_id = %team_id,
                            application = %fact.application_name,
                            "No registered application matches fact; skipping"
                        );
                    }
                    Err(e) => {
                        warn!(
                            team_id = %team_id,
                            application = %fact.application_name,
                            asset = %fact.cloud_asset_id,
                            error = %e,
                            "Failed to reconcile deployment fact"
                        );
                        report.errors += 1;
                    }
                }
                report.discoveries.push(fact);
            }
        }

        info!(
            team_id = %team_id,
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            "🔄 RECONCILIATION: {}",
            report.message()
        );
        self.events.publish(
            events::RECONCILIATION_FINISHED,
            json!({
                "team_id": team_id,
                "created": report.created,
                "updated": report.updated,
                "errors": report.errors,
            }),
        );
        Ok(report)
    }

    /// Merge one fact: resolve the application by exact name, resolve or
    /// create the backing catalog resource, then upsert the deployment by
    /// natural key. Returns `None` when no application matches.
    async fn apply_fact(
        &self,
        team_id: Uuid,
        credential: &Credential,
        fact: &DeploymentFact,
    ) -> Result<Option<UpsertOutcome<crate::models::Deployment>>> {
        let Some(application) = self
            .stores
            .applications
            .find_by_name(team_id, &fact.application_name)
            .await?
        else {
            return Ok(None);
        };

        let resource = self
            .stores
            .resources
            .find_or_create(NewResource {
                team_id,
                provider_id: credential.provider_id,
                provider_resource_id: fact.cloud_asset_id.clone(),
                name: fact.cloud_asset_id.clone(),
                resource_type: fact.kind.clone(),
                region: None,
                status: fact.status.clone(),
                metadata: fact.metadata.clone(),
            })
            .await?;

        let key = DeploymentKey {
            application_id: application.application_id,
            resource_id: resource.resource_id,
            environment_name: fact.environment_name.clone(),
        };
        let outcome = self
            .stores
            .deployments
            .upsert(
                team_id,
                &key,
                &fact.kind,
                DeploymentPatch {
                    status: fact.status.clone(),
                    version: fact.version.clone(),
                    health_check_url: fact.health_check_url.clone(),
                    metadata: fact.metadata.clone(),
                },
            )
            .await?;
        Ok(Some(outcome))
    }
}
