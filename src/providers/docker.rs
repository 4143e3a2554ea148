//! Container runtime adapter speaking the Docker Engine HTTP API. Containers
//! are catalog resources; labels mark the workloads that participate in
//! deployment discovery. Snapshot commits the container to an image.

use super::types::{BackupRecord, DeploymentFact, ResourceFact};
use super::{check_response_status, AdapterError, AdapterResult, ProviderAdapter};
use crate::constants::provider_names;
use crate::models::{Credential, Resource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

const APPLICATION_LABEL: &str = "fleetops.application";
const ENVIRONMENT_LABEL: &str = "fleetops.environment";
const VERSION_LABEL: &str = "fleetops.version";
const HEALTH_CHECK_LABEL: &str = "fleetops.health-check-url";

#[derive(Debug, Deserialize)]
struct DockerConfig {
    /// Engine API endpoint, e.g. `http://127.0.0.1:2375`
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ContainerSummary {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Labels", default)]
    labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug)]
pub struct DockerAdapter {
    client: reqwest::Client,
}

impl DockerAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn parse_config(credential: &Credential) -> AdapterResult<DockerConfig> {
        serde_json::from_value(credential.config.clone())
            .map_err(|e| AdapterError::Config(format!("docker credential config: {e}")))
    }

    async fn list_containers(&self, config: &DockerConfig) -> AdapterResult<Vec<ContainerSummary>> {
        let response = self
            .client
            .get(format!("{}/containers/json", config.endpoint))
            .query(&[("all", "true")])
            .send()
            .await?;
        check_response_status(response.status(), "docker")?;
        response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("docker container list: {e}")))
    }
}

impl Default for DockerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn container_name(container: &ContainerSummary) -> String {
    container
        .names
        .first()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| container.id.clone())
}

fn container_to_fact(container: ContainerSummary) -> ResourceFact {
    let name = container_name(&container);
    ResourceFact {
        provider_resource_id: container.id,
        name,
        resource_type: "container".to_string(),
        region: None,
        status: container.state,
        metadata: json!({ "image": container.image, "labels": container.labels }),
    }
}

fn container_to_deployment(container: &ContainerSummary) -> Option<DeploymentFact> {
    let application_name = container.labels.get(APPLICATION_LABEL)?.clone();
    Some(DeploymentFact {
        application_name,
        cloud_asset_id: container.id.clone(),
        environment_name: container
            .labels
            .get(ENVIRONMENT_LABEL)
            .cloned()
            .unwrap_or_else(|| "production".to_string()),
        kind: "container".to_string(),
        status: container.state.clone(),
        version: container.labels.get(VERSION_LABEL).cloned(),
        health_check_url: container.labels.get(HEALTH_CHECK_LABEL).cloned(),
        metadata: json!({ "image": container.image, "labels": container.labels }),
    })
}

#[async_trait]
impl ProviderAdapter for DockerAdapter {
    fn provider_name(&self) -> &'static str {
        provider_names::DOCKER
    }

    async fn discover(&self, credential: &Credential) -> AdapterResult<Vec<ResourceFact>> {
        let config = Self::parse_config(credential)?;
        let containers = self.list_containers(&config).await?;
        debug!(count = containers.len(), "docker discovery finished");
        Ok(containers.into_iter().map(container_to_fact).collect())
    }

    async fn snapshot(
        &self,
        credential: &Credential,
        resource: &Resource,
    ) -> AdapterResult<BackupRecord> {
        let config = Self::parse_config(credential)?;
        let response = self
            .client
            .post(format!("{}/commit", config.endpoint))
            .query(&[
                ("container", resource.provider_resource_id.as_str()),
                ("repo", "fleetops-backup"),
                ("tag", resource.name.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Container vanished between catalog scan and backup run
            return Ok(BackupRecord::failed(
                resource.resource_id,
                &resource.name,
                format!("container {} no longer exists", resource.provider_resource_id),
            ));
        }
        check_response_status(response.status(), "docker")?;

        let commit: CommitResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Protocol(format!("docker commit response: {e}")))?;
        // The engine does not report committed image size on this call
        Ok(BackupRecord::completed(
            resource.resource_id,
            &resource.name,
            commit.id,
            None,
        ))
    }

    async fn discover_deployments(
        &self,
        credential: &Credential,
    ) -> AdapterResult<Vec<DeploymentFact>> {
        let config = Self::parse_config(credential)?;
        let containers = self.list_containers(&config).await?;
        Ok(containers.iter().filter_map(container_to_deployment).collect())
    }
}
