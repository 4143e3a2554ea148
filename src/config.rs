use crate::constants::defaults;
use crate::error::{FleetError, Result};

/// Runtime configuration, resolved from environment variables with sane
/// defaults for embedded and development use.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// PostgreSQL connection string; `None` selects the in-memory backend
    pub database_url: Option<String>,
    /// Number of orchestration workers consuming the submission queue
    pub worker_count: usize,
    /// Capacity of the bounded submission queue (backpressure limit)
    pub queue_capacity: usize,
    /// Deadline applied to every provider adapter call
    pub adapter_timeout_ms: u64,
    /// Capacity of the lifecycle event broadcast channel
    pub event_channel_capacity: usize,
    /// Bind address for the HTTP API
    pub bind_address: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            worker_count: defaults::WORKER_COUNT,
            queue_capacity: defaults::QUEUE_CAPACITY,
            adapter_timeout_ms: defaults::ADAPTER_TIMEOUT_MS,
            event_channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl FleetConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            if !db_url.is_empty() {
                config.database_url = Some(db_url);
            }
        }

        if let Ok(workers) = std::env::var("FLEETOPS_WORKER_COUNT") {
            config.worker_count = workers.parse().map_err(|e| {
                FleetError::ConfigurationError(format!("Invalid worker_count: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("FLEETOPS_QUEUE_CAPACITY") {
            config.queue_capacity = capacity.parse().map_err(|e| {
                FleetError::ConfigurationError(format!("Invalid queue_capacity: {e}"))
            })?;
        }

        if let Ok(timeout) = std::env::var("FLEETOPS_ADAPTER_TIMEOUT_MS") {
            config.adapter_timeout_ms = timeout.parse().map_err(|e| {
                FleetError::ConfigurationError(format!("Invalid adapter_timeout_ms: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("FLEETOPS_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                FleetError::ConfigurationError(format!("Invalid event_channel_capacity: {e}"))
            })?;
        }

        if let Ok(bind) = std::env::var("FLEETOPS_BIND_ADDRESS") {
            config.bind_address = bind;
        }

        Ok(config)
    }
}
