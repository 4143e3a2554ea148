use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered application within a team. Deployments can only attach to
/// pre-registered applications, matched by exact name during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl Application {
    pub fn new(team_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            application_id: Uuid::new_v4(),
            team_id,
            name: name.into(),
            description: None,
        }
    }
}
