use crate::models::BackupStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One unit of discovery output. Ephemeral: produced per run and persisted
/// into the resource catalog via upsert, never stored directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFact {
    /// Provider-assigned identifier, the catalog natural key per team
    pub provider_resource_id: String,
    pub name: String,
    pub resource_type: String,
    pub region: Option<String>,
    pub status: String,
    pub metadata: Value,
}

/// Outcome of one snapshot attempt against one catalog resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub resource_id: Uuid,
    pub resource_name: String,
    pub backup_id: Option<String>,
    pub size_bytes: Option<i64>,
    pub status: BackupStatus,
    pub error_message: Option<String>,
}

impl BackupRecord {
    pub fn completed(
        resource_id: Uuid,
        resource_name: impl Into<String>,
        backup_id: impl Into<String>,
        size_bytes: Option<i64>,
    ) -> Self {
        Self {
            resource_id,
            resource_name: resource_name.into(),
            backup_id: Some(backup_id.into()),
            size_bytes,
            status: BackupStatus::Completed,
            error_message: None,
        }
    }

    pub fn failed(
        resource_id: Uuid,
        resource_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            resource_id,
            resource_name: resource_name.into(),
            backup_id: None,
            size_bytes: None,
            status: BackupStatus::Failed,
            error_message: Some(error.into()),
        }
    }
}

/// Discovery output describing a running workload. Never persisted directly;
/// the reconciler merges facts into the deployment catalog by natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentFact {
    /// Must match a registered application name exactly to be reconciled
    pub application_name: String,
    /// External asset identifier backing the deployment (instance id, container id)
    pub cloud_asset_id: String,
    pub environment_name: String,
    pub kind: String,
    pub status: String,
    pub version: Option<String>,
    pub health_check_url: Option<String>,
    pub metadata: Value,
}
