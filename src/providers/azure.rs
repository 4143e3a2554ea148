//! Azure provider adapter. Lists virtual machines under the configured
//! subscription; VM tags drive deployment discovery.

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
struct AzureConfig {
    endpoint: String,
    subscription_id: String,
    client_id: String,
    client_secret: String,
}

/// Azure list responses wrap results in a `value` array
#[derive(Debug, Deserialize)]
struct VmList {
    value: Vec<VirtualMachine>,
}

#[derive(Debug, Deserialize)]
struct VirtualMachine {
    id: String,
    name: String,
    #[serde(rename = "vmSize")]
    vm_size: String,
    #[serde(rename = "provisioningState")]
    provisioning_state: String,
    location: String,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AzureSnapshot {
    id: String,
    #[serde(rename = "diskSizeBytes", default)]
    disk_size_bytes: Option<i64>,
}

#[derive(Debug)]
pub struct AzureAdapter {
    client: reqwest::Client,
}

impl AzureAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn parse_config(credential: &Credential) -> AdapterResult<AzureConfig> {
        serde_json::from_value(credential.config.clone())
            .map_err(|e| AdapterError::Config(format!("azure credential config: {e}")))
    }
}

impl Default for AzureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn vm_to_fact(vm: VirtualMachine) -> ResourceFact {
    ResourceFact {
        provider_resource_id: vm.id,
        name: vm.name,
        resource_type: vm.vm_size,
        region: Some(vm.location),
        status: vm.provisioning_state,
        metadata: json!({ "tags": vm.tags }),
    }
}

fn vm_to_deployment(vm: &VirtualMachine) -> Option<DeploymentFact> {
    let application_name = vm.tags.get("application")?.clone();
    Some(DeploymentFact {
        application_name,
        cloud_asset_id: vm.id.clone(),
        environment_name: vm
            .tags
            .get("environment")
            .cloned()
            .unwrap_or_else(|| "production".to_string()),
        kind: "vm".to_string(),
        status: vm.provisioning_state.clone(),
        version: vm.tags.get("version").cloned(),
        health_check_url: vm.tags.get("health-check-url").cloned(),
        metadata: json!({ "tags": vm.tags, "location": vm.location }),
    })
}

#[async_trait]
impl ProviderAdapter for AzureAdapter {
    fn provider_name(&self) -> &'static str {
        provider_names::AZURE
    }

    async fn discover(&self, credential: &Credential) -> AdapterResult<Vec<ResourceFact>> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .get(format!(
                "{}/subscriptions/{}/virtualMachines",
                config.endpoint, config.subscription_id
            ))
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .send()
            .await?;
        check_response_status(response.status(), "azure")?;

        let list: VmList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("azure vm list: {e}")))?;
        debug!(count = list.value.len(), "azure discovery finished");
        Ok(list.value.into_iter().map(vm_to_fact).collect())
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
                "{}/subscriptions/{}/snapshots",
                config.endpoint, config.subscription_id
            ))
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .json(&json!({ "sourceResourceId": resource.provider_resource_id }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(BackupRecord::failed(
                resource.resource_id,
                &resource.name,
                format!("azure refused snapshot of {}", resource.provider_resource_id),
            ));
        }
        check_response_status(response.status(), "azure")?;

        let snapshot: AzureSnapshot = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("azure snapshot response: {e}")))?;
        Ok(BackupRecord::completed(
            resource.resource_id,
            &resource.name,
            snapshot.id,
            snapshot.disk_size_bytes,
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
                "{}/subscriptions/{}/virtualMachines",
                config.endpoint, config.subscription_id
            ))
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .send()
            .await?;
        check_response_status(response.status(), "azure")?;

        let list: VmList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("azure vm list: {e}")))?;
        Ok(list.value.iter().filter_map(vm_to_deployment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_mapping_keeps_location_as_region() {
        let vm = VirtualMachine {
            id: "/subscriptions/s1/vm/web-0".to_string(),
            name: "web-0".to_string(),
            vm_size: "Standard_B2s".to_string(),
            provisioning_state: "Succeeded".to_string(),
            location: "westeurope".to_string(),
            tags: HashMap::new(),
        };
        let fact = vm_to_fact(vm);
        assert_eq!(fact.region.as_deref(), Some("westeurope"));
        assert_eq!(fact.resource_type, "Standard_B2s");
    }
}
