//! AWS provider adapter. Talks to the EC2-compatible REST surface configured
//! on the credential; instance tags carry the application/environment hints
//! used for deployment discovery.

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
struct AwsConfig {
    endpoint: String,
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstanceList {
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
struct Instance {
    instance_id: String,
    #[serde(default)]
    name: Option<String>,
    instance_type: String,
    state: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    snapshot_id: String,
    #[serde(default)]
    size_bytes: Option<i64>,
}

#[derive(Debug)]
pub struct AwsAdapter {
    client: reqwest::Client,
}

impl AwsAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn parse_config(credential: &Credential) -> AdapterResult<AwsConfig> {
        serde_json::from_value(credential.config.clone())
            .map_err(|e| AdapterError::Config(format!("aws credential config: {e}")))
    }
}

impl Default for AwsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn instance_to_fact(instance: Instance, default_region: Option<&str>) -> ResourceFact {
    let name = instance
        .name
        .clone()
        .or_else(|| instance.tags.get("Name").cloned())
        .unwrap_or_else(|| instance.instance_id.clone());
    ResourceFact {
        provider_resource_id: instance.instance_id,
        name,
        resource_type: instance.instance_type,
        region: instance
            .region
            .or_else(|| default_region.map(str::to_string)),
        status: instance.state,
        metadata: json!({ "tags": instance.tags }),
    }
}

fn instance_to_deployment(instance: &Instance) -> Option<DeploymentFact> {
    // Only tagged instances participate in deployment discovery
    let application_name = instance.tags.get("application")?.clone();
    let environment_name = instance
        .tags
        .get("environment")
        .cloned()
        .unwrap_or_else(|| "production".to_string());
    Some(DeploymentFact {
        application_name,
        cloud_asset_id: instance.instance_id.clone(),
        environment_name,
        kind: "vm".to_string(),
        status: instance.state.clone(),
        version: instance.tags.get("version").cloned(),
        health_check_url: instance.tags.get("health-check-url").cloned(),
        metadata: json!({ "tags": instance.tags }),
    })
}

#[async_trait]
impl ProviderAdapter for AwsAdapter {
    fn provider_name(&self) -> &'static str {
        provider_names::AWS
    }

    async fn discover(&self, credential: &Credential) -> AdapterResult<Vec<ResourceFact>> {
        let config = Self::parse_config(credential)?;
        let mut request = self
            .client
            .get(format!("{}/v1/instances", config.endpoint))
            .basic_auth(&config.access_key_id, Some(&config.secret_access_key));
        if let Some(region) = &config.region {
            request = request.query(&[("region", region)]);
        }

        let response = request.send().await?;
        check_response_status(response.status(), "aws")?;
        let list: InstanceList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("aws instance list: {e}")))?;

        debug!(count = list.instances.len(), "aws discovery finished");
        Ok(list
            .instances
            .into_iter()
            .map(|i| instance_to_fact(i, config.region.as_deref()))
            .collect())
    }

    async fn snapshot(
        &self,
        credential: &Credential,
        resource: &Resource,
    ) -> AdapterResult<BackupRecord> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .post(format!("{}/v1/snapshots", config.endpoint))
            .basic_auth(&config.access_key_id, Some(&config.secret_access_key))
            .json(&json!({ "instance_id": resource.provider_resource_id }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            // Snapshot rejected for this instance (e.g. unsupported volume
            // state); recoverable at per-resource granularity
            return Ok(BackupRecord::failed(
                resource.resource_id,
                &resource.name,
                format!(
                    "aws refused snapshot of {}: {}",
                    resource.provider_resource_id,
                    response.status()
                ),
            ));
        }
        check_response_status(response.status(), "aws")?;

        let snapshot: SnapshotResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("aws snapshot response: {e}")))?;
        Ok(BackupRecord::completed(
            resource.resource_id,
            &resource.name,
            snapshot.snapshot_id,
            snapshot.size_bytes,
        ))
    }

    async fn discover_deployments(
        &self,
        credential: &Credential,
    ) -> AdapterResult<Vec<DeploymentFact>> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .get(format!("{}/v1/instances", config.endpoint))
            .basic_auth(&config.access_key_id, Some(&config.secret_access_key))
            .send()
            .await?;
        check_response_status(response.status(), "aws")?;
        let list: InstanceList = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("aws instance list: {e}")))?;

        Ok(list
            .instances
            .iter()
            .filter_map(instance_to_deployment)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_instance(tags: &[(&str, &str)]) -> Instance {
        Instance {
            instance_id: "i-0abc".to_string(),
            name: None,
            instance_type: "t3.micro".to_string(),
            state: "running".to_string(),
            region: None,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_fact_falls_back_to_name_tag() {
        let fact = instance_to_fact(tagged_instance(&[("Name", "web-1")]), Some("us-east-1"));
        assert_eq!(fact.name, "web-1");
        assert_eq!(fact.provider_resource_id, "i-0abc");
        assert_eq!(fact.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_untagged_instance_produces_no_deployment() {
        assert!(instance_to_deployment(&tagged_instance(&[("Name", "web-1")])).is_none());
    }

    #[test]
    fn test_tagged_instance_produces_deployment() {
        let fact = instance_to_deployment(&tagged_instance(&[
            ("application", "web-app"),
            ("environment", "staging"),
            ("version", "1.4.2"),
        ]))
        .unwrap();
        assert_eq!(fact.application_name, "web-app");
        assert_eq!(fact.environment_name, "staging");
        assert_eq!(fact.version.as_deref(), Some("1.4.2"));
        assert_eq!(fact.cloud_asset_id, "i-0abc");
    }
}
