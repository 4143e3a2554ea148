//! Lifecycle event system foundation. Executions and reconciliation runs
//! publish events here; in-process subscribers (metrics, test probes) attach
//! through [`EventPublisher::subscribe`].

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent};
