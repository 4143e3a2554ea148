use std::fmt;

/// Top-level error type for the fleetops core.
///
/// Lookup failures that decide an execution's fate are distinct variants so
/// callers and tests can distinguish causes without string matching.
#[derive(Debug, Clone, PartialEq)]
pub enum FleetError {
    /// No credential registered for the (team, provider) pair
    CredentialNotFound(String),
    /// Provider reference data missing for the given identifier
    ProviderNotFound(String),
    /// No adapter registered under the provider's internal name
    UnsupportedProvider(String),
    DatabaseError(String),
    OrchestrationError(String),
    StateTransitionError(String),
    AdapterError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::CredentialNotFound(msg) => write!(f, "Credential not found: {msg}"),
            FleetError::ProviderNotFound(msg) => write!(f, "Provider not found: {msg}"),
            FleetError::UnsupportedProvider(msg) => write!(f, "Unsupported provider: {msg}"),
            FleetError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            FleetError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            FleetError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            FleetError::AdapterError(msg) => write!(f, "Adapter error: {msg}"),
            FleetError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            FleetError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for FleetError {}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::ValidationError(format!("JSON serialization failed: {err}"))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for FleetError {
    fn from(err: sqlx::Error) -> Self {
        FleetError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
