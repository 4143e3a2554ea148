#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # FleetOps Core
//!
//! Core engine for coordinating asynchronous work against heterogeneous
//! external cloud providers on behalf of isolated teams, and for keeping an
//! internal catalog of discovered resources and application deployments
//! consistent with provider-side reality.
//!
//! ## Architecture
//!
//! Two subsystems carry the load:
//!
//! - **Task orchestration**: submissions land on the execution ledger in
//!   `pending`, a bounded worker pool drives each execution through
//!   `running` to `completed`/`failed`, dispatching to the provider adapter
//!   registered for the target provider and persisting results into the
//!   resource catalog. Terminal states always fan out notifications.
//! - **Deployment reconciliation**: discovery sources are polled per team
//!   and their facts merged into the deployment catalog by natural key
//!   `(application, resource, environment)`, converging on one row per key
//!   no matter how often discovery re-runs.
//!
//! ## Module Organization
//!
//! - [`models`] - Persisted entities and reference data
//! - [`state_machine`] - Execution lifecycle states and transition rules
//! - [`providers`] - Provider adapter capability and implementations
//! - [`registry`] - Name-keyed adapter registry
//! - [`storage`] - Store traits with in-memory and PostgreSQL backends
//! - [`orchestration`] - Submission queue, worker pool, execution runner
//! - [`discovery`] - Deployment reconciliation
//! - [`notifications`] - Terminal-state notification fan-out
//! - [`events`] - Lifecycle event publishing
//! - [`web`] - HTTP API (submission, projections, reconciliation trigger)
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetops_core::config::FleetConfig;
//! use fleetops_core::events::EventPublisher;
//! use fleetops_core::orchestration::TaskOrchestrator;
//! use fleetops_core::registry::AdapterRegistry;
//! use fleetops_core::storage::{MemoryBackend, Stores};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FleetConfig::default();
//! let stores = Stores::from_memory(Arc::new(MemoryBackend::new()));
//! let registry = Arc::new(AdapterRegistry::with_builtin_adapters());
//! let events = EventPublisher::default();
//!
//! let orchestrator = TaskOrchestrator::start(&config, stores, registry, events);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod orchestration;
pub mod providers;
pub mod registry;
pub mod state_machine;
pub mod storage;
pub mod web;

pub use config::FleetConfig;
pub use error::{FleetError, Result};
pub use state_machine::ExecutionState;
