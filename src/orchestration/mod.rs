//! # Task Orchestration
//!
//! Submission, queueing, and execution of provider tasks against the
//! execution ledger. The orchestrator owns the worker pool; the runner owns
//! one execution's lifecycle from `running` to its terminal state.

pub mod executor;
pub mod orchestrator;
pub mod types;

pub use executor::ExecutionRunner;
pub use orchestrator::TaskOrchestrator;
pub use types::{BackupSummary, InventorySummary};
