//! System-wide constants shared across orchestration and discovery.

/// Internal provider names used for adapter dispatch
pub mod provider_names {
    pub const AWS: &str = "aws";
    pub const AZURE: &str = "azure";
    pub const GCP: &str = "gcp";
    pub const DOCKER: &str = "docker";
}

/// Lifecycle event names published on the event bus
pub mod events {
    pub const EXECUTION_SUBMITTED: &str = "execution.submitted";
    pub const EXECUTION_STARTED: &str = "execution.started";
    pub const EXECUTION_COMPLETED: &str = "execution.completed";
    pub const EXECUTION_FAILED: &str = "execution.failed";
    pub const RECONCILIATION_FINISHED: &str = "reconciliation.finished";
}

/// Default bounds for the orchestration worker pool
pub mod defaults {
    pub const WORKER_COUNT: usize = 4;
    pub const QUEUE_CAPACITY: usize = 256;
    pub const ADAPTER_TIMEOUT_MS: u64 = 30_000;
    pub const EVENT_CHANNEL_CAPACITY: usize = 1000;
}
