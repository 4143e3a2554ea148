use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution lifecycle state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Initial state when the execution is submitted
    Pending,
    /// Execution is being processed by a worker
    Running,
    /// Execution finished; item-level failures may still be in the result
    Completed,
    /// Execution failed as a whole (configuration or adapter error)
    Failed,
}

impl ExecutionState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an active state (a worker is processing)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Monotonic transition rules: pending -> running -> completed | failed.
    /// Everything else, including re-entering a terminal state, is rejected.
    pub fn can_transition_to(&self, next: ExecutionState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ExecutionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid execution state: {s}")),
        }
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(ExecutionState::Completed.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(!ExecutionState::Pending.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(ExecutionState::Pending.can_transition_to(ExecutionState::Running));
        assert!(ExecutionState::Running.can_transition_to(ExecutionState::Completed));
        assert!(ExecutionState::Running.can_transition_to(ExecutionState::Failed));
    }

    #[test]
    fn test_rejected_transitions() {
        // No regression
        assert!(!ExecutionState::Running.can_transition_to(ExecutionState::Pending));
        assert!(!ExecutionState::Completed.can_transition_to(ExecutionState::Running));
        // No skipping pending -> terminal
        assert!(!ExecutionState::Pending.can_transition_to(ExecutionState::Completed));
        assert!(!ExecutionState::Pending.can_transition_to(ExecutionState::Failed));
        // Terminal states are never re-entered
        assert!(!ExecutionState::Completed.can_transition_to(ExecutionState::Completed));
        assert!(!ExecutionState::Failed.can_transition_to(ExecutionState::Completed));
        assert!(!ExecutionState::Completed.can_transition_to(ExecutionState::Failed));
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(ExecutionState::Running.to_string(), "running");
        assert_eq!(
            "completed".parse::<ExecutionState>().unwrap(),
            ExecutionState::Completed
        );
        assert!("cancelled".parse::<ExecutionState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let state = ExecutionState::Running;
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"running\"");
        let parsed: ExecutionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
