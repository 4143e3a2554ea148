use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Team-scoped provider credential. The `config` blob is opaque to the
/// orchestrator (auth material, region, endpoints) and only interpreted by
/// the matching provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub credential_id: Uuid,
    pub team_id: Uuid,
    pub provider_id: Uuid,
    pub config: Value,
    pub active: bool,
}

impl Credential {
    pub fn new(team_id: Uuid, provider_id: Uuid, config: Value) -> Self {
        Self {
            credential_id: Uuid::new_v4(),
            team_id,
            provider_id,
            config,
            active: true,
        }
    }
}
