//! GCP provider adapter. Lists compute instances in the configured project;
//! instance labels drive deployment discovery.

use super::types::{BackupRecord, DeploymentFact, ResourceFact};
use super::{check_response_status, AdapterError, AdapterResult, ProviderAdapter};
use crate::constants::provider_names;
use crate::models::{Credential, Resource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GcpConfig {
    endpoint: String,
    project_id: String,
    access_token: String,
}

/// GCP list responses carry results in an `items` array
#[derive(Debug, Deserialize)]
struct InstanceList {
    #[serde(default)]
    items: Vec<GcpInstance>,
}

#[derive(Debug, Deserialize)]
struct GcpInstance {
    id: String,
    name: String,
    #[serde(rename = "machineType")]
    machine_type: String,
    status: String,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct MachineImage {
    id: String,
    #[serde(rename = "totalStorageBytes", default)]
    total_storage_bytes: Option<i64>,
}

#[derive(Debug)]
pub struct GcpAdapter {
    client: reqwest::Client,
}

impl GcpAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn parse_config(credential: &Credential) -> AdapterResult<GcpConfig> {
        serde_json::from_value(credential.config.clone())
            .map_err(|e| AdapterError::Config(format!("gcp credential config: {e}")))
    }
}

impl Default for GcpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn instance_to_fact(instance: GcpInstance) -> ResourceFact {
    ResourceFact {
        provider_resource_id: instance.id,
        name: instance.name,
        resource_type: instance.machine_type,
        region: instance.zone,
        status: instance.status,
        metadata: json!({ "labels": instance.labels }),
    }
}

fn instance_to_deployment(instance: &GcpInstance) -> Option<DeploymentFact> {
    let application_name = instance.labels.get("application")?.clone();
    Some(DeploymentFact {
        application_name,
        cloud_asset_id: instance.id.clone(),
        environment_name: instance
            .labels
            .get("environment")
            .cloned()
            .unwrap_or_else(|| "production".to_string()),
        kind: "vm".to_string(),
        status: instance.status.clone(),
        version: instance.labels.get("version").cloned(),
        health_check_url: instance.labels.get("health-check-url").cloned(),
        metadata: json!({ "labels": instance.labels }),
    })
}

#[async_trait]
impl ProviderAdapter for GcpAdapter {
    fn provider_name(&self) -> &'static str {
        provider_names::GCP
    }

    async fn discover(&self, credential: &Credential) -> AdapterResult<Vec<ResourceFact>> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .get(format!(
                "{}/projects/{}/instances",
                config.endpoint, config.project_id
            ))
            .bearer_auth(&config.access_token)
            .send()
            .await?;
        check_response_status(response.status(), "gcp")?;

        let list: InstanceList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("gcp instance list: {e}")))?;
        debug!(count = list.items.len(), "gcp discovery finished");
        Ok(list.items.into_iter().map(instance_to_fact).collect())
    }

    async fn snapshot(
        &self,
        credential: &Credential,
        resource: &Resource,
    ) -> AdapterResult<BackupRecord> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .post(format!(
                "{}/projects/{}/machineImages",
                config.endpoint, config.project_id
            ))
            .bearer_auth(&config.access_token)
            .json(&json!({ "sourceInstance": resource.provider_resource_id }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(BackupRecord::failed(
                resource.resource_id,
                &resource.name,
                format!("gcp refused machine image of {}", resource.provider_resource_id),
            ));
        }
        check_response_status(response.status(), "gcp")?;

        let image: MachineImage = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("gcp machine image response: {e}")))?;
        Ok(BackupRecord::completed(
            resource.resource_id,
            &resource.name,
            image.id,
            image.total_storage_bytes,
        ))
    }

    async fn discover_deployments(
        &self,
        credential: &Credential,
    ) -> AdapterResult<Vec<DeploymentFact>> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .get(format!(
                "{}/projects/{}/instances",
                config.endpoint, config.project_id
            ))
            .bearer_auth(&config.access_token)
            .send()
            .await?;
        check_response_status(response.status(), "gcp")?;

        let list: InstanceList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("gcp instance list: {e}")))?;
        Ok(list.items.iter().filter_map(instance_to_deployment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_instance_produces_deployment() {
        let mut labels = HashMap::new();
        labels.insert("application".to_string(), "billing-api".to_string());
        labels.insert("environment".to_string(), "prod".to_string());
        let instance = GcpInstance {
            id: "4623718".to_string(),
            name: "billing-0".to_string(),
            machine_type: "e2-medium".to_string(),
            status: "RUNNING".to_string(),
            zone: Some("europe-west1-b".to_string()),
            labels,
        };
        let fact = instance_to_deployment(&instance).unwrap();
        assert_eq!(fact.application_name, "billing-api");
        assert_eq!(fact.environment_name, "prod");
        assert_eq!(fact.kind, "vm");
    }
}
