use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Natural key identifying one deployment: an application running in one
/// environment on one catalog resource. At most one live row exists per key
/// per team; reconciliation upserts against it and never duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentKey {
    pub application_id: Uuid,
    pub resource_id: Uuid,
    pub environment_name: String,
}

/// Fields reconciliation may rewrite on an existing deployment. Manually
/// entered columns outside this set are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPatch {
    pub status: String,
    pub version: Option<String>,
    pub health_check_url: Option<String>,
    pub metadata: Value,
}

/// The durable, reconciled record of one running workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: Uuid,
    pub team_id: Uuid,
    pub application_id: Uuid,
    pub resource_id: Uuid,
    pub environment_name: String,
    pub kind: String,
    pub status: String,
    pub version: Option<String>,
    pub health_check_url: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Deployment for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeployment {
    pub team_id: Uuid,
    pub application_id: Uuid,
    pub resource_id: Uuid,
    pub environment_name: String,
    pub kind: String,
    pub status: String,
    pub version: Option<String>,
    pub health_check_url: Option<String>,
    pub metadata: Value,
}

impl Deployment {
    pub fn from_new(new: NewDeployment) -> Self {
        let now = Utc::now();
        Self {
            deployment_id: Uuid::new_v4(),
            team_id: new.team_id,
            application_id: new.application_id,
            resource_id: new.resource_id,
            environment_name: new.environment_name,
            kind: new.kind,
            status: new.status,
            version: new.version,
            health_check_url: new.health_check_url,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn natural_key(&self) -> DeploymentKey {
        DeploymentKey {
            application_id: self.application_id,
            resource_id: self.resource_id,
            environment_name: self.environment_name.clone(),
        }
    }

    /// Apply reconciliation updates to the mutable fields in place
    pub fn apply_patch(&mut self, patch: DeploymentPatch) {
        self.status = patch.status;
        self.version = patch.version;
        self.health_check_url = patch.health_check_url;
        self.metadata = patch.metadata;
        self.updated_at = Utc::now();
    }
}
