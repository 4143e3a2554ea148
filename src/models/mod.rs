//! Persisted entities and reference data for the fleetops catalog.

pub mod application;
pub mod backup_job;
pub mod credential;
pub mod deployment;
pub mod execution;
pub mod notification;
pub mod provider;
pub mod resource;

pub use application::Application;
pub use backup_job::{BackupJob, BackupStatus, NewBackupJob};
pub use credential::Credential;
pub use deployment::{Deployment, DeploymentKey, DeploymentPatch, NewDeployment};
pub use execution::{Execution, NewExecution, TaskType};
pub use notification::{NewNotification, Notification, NotificationKind, NotificationTransport};
pub use provider::Provider;
pub use resource::{NewResource, Resource};
