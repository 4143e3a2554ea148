use crate::state_machine::ExecutionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Task types the orchestrator can run against a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Read-only enumeration of provider-side resources
    Inventory,
    /// Point-in-time snapshot of every catalog resource for the provider
    Backup,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inventory => write!(f, "inventory"),
            Self::Backup => write!(f, "backup"),
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(Self::Inventory),
            "backup" => Ok(Self::Backup),
            _ => Err(format!("Invalid task type: {s}")),
        }
    }
}

/// Execution represents one orchestration attempt, tracked through its
/// lifecycle in the ledger. Rows are never deleted; they serve as the
/// audit trail for every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: Uuid,
    pub team_id: Uuid,
    pub provider_id: Uuid,
    pub task_type: TaskType,
    pub state: ExecutionState,
    pub error_message: Option<String>,
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// New Execution for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExecution {
    pub team_id: Uuid,
    pub provider_id: Uuid,
    pub task_type: TaskType,
}

impl Execution {
    /// Build a fresh ledger entry in `pending` state
    pub fn from_new(new: NewExecution) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            team_id: new.team_id,
            provider_id: new.provider_id,
            task_type: new.task_type,
            state: ExecutionState::Pending,
            error_message: None,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_string_conversion() {
        assert_eq!(TaskType::Inventory.to_string(), "inventory");
        assert_eq!("backup".parse::<TaskType>().unwrap(), TaskType::Backup);
        assert!("restore".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_new_execution_starts_pending() {
        let execution = Execution::from_new(NewExecution {
            team_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            task_type: TaskType::Inventory,
        });
        assert_eq!(execution.state, ExecutionState::Pending);
        assert!(execution.error_message.is_none());
        assert!(execution.result.is_none());
        assert!(execution.started_at.is_none());
    }
}
