use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of one snapshot attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    Completed,
    Failed,
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for BackupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid backup status: {s}")),
        }
    }
}

/// Standalone audit row recorded for each successful snapshot, kept for
/// later inspection independently of the execution result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupJob {
    pub backup_job_id: Uuid,
    pub team_id: Uuid,
    pub resource_id: Uuid,
    pub backup_id: String,
    pub size_bytes: Option<i64>,
    pub status: BackupStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New BackupJob for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBackupJob {
    pub team_id: Uuid,
    pub resource_id: Uuid,
    pub backup_id: String,
    pub size_bytes: Option<i64>,
    pub status: BackupStatus,
    pub error_message: Option<String>,
}

impl BackupJob {
    pub fn from_new(new: NewBackupJob) -> Self {
        Self {
            backup_job_id: Uuid::new_v4(),
            team_id: new.team_id,
            resource_id: new.resource_id,
            backup_id: new.backup_id,
            size_bytes: new.size_bytes,
            status: new.status,
            error_message: new.error_message,
            created_at: Utc::now(),
        }
    }
}
