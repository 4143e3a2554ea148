use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A discovered external resource in the catalog. Upserted on the natural
/// key `(team_id, provider_resource_id)` so repeated scans converge on one
/// row per provider-side asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: Uuid,
    pub team_id: Uuid,
    pub provider_id: Uuid,
    /// Provider-assigned identifier (instance id, VM id, container id)
    pub provider_resource_id: String,
    pub name: String,
    pub resource_type: String,
    pub region: Option<String>,
    pub status: String,
    pub metadata: Value,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Resource for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub team_id: Uuid,
    pub provider_id: Uuid,
    pub provider_resource_id: String,
    pub name: String,
    pub resource_type: String,
    pub region: Option<String>,
    pub status: String,
    pub metadata: Value,
}

impl Resource {
    pub fn from_new(new: NewResource) -> Self {
        let now = Utc::now();
        Self {
            resource_id: Uuid::new_v4(),
            team_id: new.team_id,
            provider_id: new.provider_id,
            provider_resource_id: new.provider_resource_id,
            name: new.name,
            resource_type: new.resource_type,
            region: new.region,
            status: new.status,
            metadata: new.metadata,
            last_scanned_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
