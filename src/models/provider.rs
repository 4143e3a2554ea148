use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider represents one external system family (cloud platform or
/// container runtime). Immutable reference data; the internal `name` is the
/// adapter dispatch key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: Uuid,
    pub name: String,
    pub display_name: String,
}

impl Provider {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            provider_id: Uuid::new_v4(),
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}
