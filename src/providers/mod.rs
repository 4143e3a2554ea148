//! # Provider Adapters
//!
//! Polymorphic capability translating generic discover/snapshot operations
//! into provider-specific calls, one implementation per provider family.
//!
//! ## Contract
//!
//! - `discover` is read-only enumeration on the provider side. An empty
//!   result is not an error; authentication and connectivity failures are,
//!   and the orchestrator treats them as fatal to the run.
//! - `snapshot` performs one point-in-time capture. Provider errors are
//!   recoverable at per-resource granularity: the adapter reports a failed
//!   [`BackupRecord`] where it can, and callers continue past hard errors.
//! - `discover_deployments` feeds the discovery reconciler with workload
//!   facts (cloud deployment APIs, container listings).
//!
//! Adapters interpret the opaque credential blob themselves; nothing outside
//! this module understands provider configuration.

pub mod aws;
pub mod azure;
pub mod docker;
pub mod gcp;
pub mod types;

pub use aws::AwsAdapter;
pub use azure::AzureAdapter;
pub use docker::DockerAdapter;
pub use gcp::GcpAdapter;
pub use types::{BackupRecord, DeploymentFact, ResourceFact};

use crate::models::{Credential, Resource};
use async_trait::async_trait;

/// Error type for provider adapter operations
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("connectivity failure: {0}")]
    Connectivity(#[from] reqwest::Error),
    #[error("invalid credential configuration: {0}")]
    Config(String),
    #[error("unexpected provider response: {0}")]
    Protocol(String),
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Polymorphic provider capability. One implementation per provider family,
/// resolved by internal provider name through the adapter registry.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Internal provider name this adapter is registered under
    fn provider_name(&self) -> &'static str;

    /// Enumerate provider-side resources (read-only, empty list is valid)
    async fn discover(&self, credential: &Credential) -> AdapterResult<Vec<ResourceFact>>;

    /// Capture a point-in-time snapshot of one resource
    async fn snapshot(
        &self,
        credential: &Credential,
        resource: &Resource,
    ) -> AdapterResult<BackupRecord>;

    /// Enumerate running workloads for deployment reconciliation
    async fn discover_deployments(
        &self,
        credential: &Credential,
    ) -> AdapterResult<Vec<DeploymentFact>>;
}

/// Map an HTTP status into the adapter error taxonomy: auth failures are
/// distinguished so the orchestrator can record a precise terminal error.
pub(crate) fn check_response_status(
    status: reqwest::StatusCode,
    provider: &str,
) -> AdapterResult<()> {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(AdapterError::Auth(format!(
            "{provider} rejected the configured credentials ({status})"
        )));
    }
    if !status.is_success() {
        return Err(AdapterError::Protocol(format!(
            "{provider} returned unexpected status {status}"
        )));
    }
    Ok(())
}
