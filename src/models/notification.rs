use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Terminal outcome kinds pushed through notification fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid notification kind: {s}")),
        }
    }
}

/// Team-scoped delivery channel. Externally managed configuration; the
/// fan-out only reads the active flag and writes one row per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTransport {
    pub transport_id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub transport_type: String,
    pub active: bool,
    pub config: Value,
}

impl NotificationTransport {
    pub fn new(team_id: Uuid, name: impl Into<String>, transport_type: impl Into<String>) -> Self {
        Self {
            transport_id: Uuid::new_v4(),
            team_id,
            name: name.into(),
            transport_type: transport_type.into(),
            active: true,
            config: Value::Null,
        }
    }
}

/// One delivered notification record referencing its transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: Uuid,
    pub team_id: Uuid,
    pub transport_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// New Notification for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub team_id: Uuid,
    pub transport_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub metadata: Value,
}

impl Notification {
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            team_id: new.team_id,
            transport_id: new.transport_id,
            kind: new.kind,
            message: new.message,
            metadata: new.metadata,
            created_at: Utc::now(),
        }
    }
}
