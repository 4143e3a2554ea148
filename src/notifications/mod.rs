//! # Notification Fan-out
//!
//! On a terminal execution state the orchestrator pushes a summary to every
//! active transport configured for the team, one notification row per
//! transport. Failures here are always swallowed: a broken transport lookup
//! or store write must never fail an otherwise-successful execution.

use crate::models::{NewNotification, NotificationKind};
use crate::storage::{NotificationStore, TransportRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationFanout {
    transports: Arc<dyn TransportRegistry>,
    store: Arc<dyn NotificationStore>,
}

impl NotificationFanout {
    pub fn new(transports: Arc<dyn TransportRegistry>, store: Arc<dyn NotificationStore>) -> Self {
        Self { transports, store }
    }

    /// Write one notification per active transport. Infallible by contract:
    /// every error is logged and dropped.
    pub async fn notify(&self, team_id: Uuid, kind: NotificationKind, message: &str, metadata: Value) {
        let transports = match self.transports.list_active(team_id).await {
            Ok(transports) => transports,
            Err(e) => {
                warn!(
                    team_id = %team_id,
                    error = %e,
                    "Notification fan-out could not list transports; dropping notification"
                );
                return;
            }
        };

        if transports.is_empty() {
            debug!(team_id = %team_id, "No active transports configured; nothing to notify");
            return;
        }

        for transport in transports {
            let result = self
                .store
                .create(NewNotification {
                    team_id,
                    transport_id: transport.transport_id,
                    kind,
                    message: message.to_string(),
                    metadata: metadata.clone(),
                })
                .await;
            if let Err(e) = result {
                warn!(
                    team_id = %team_id,
                    transport = %transport.name,
                    error = %e,
                    "Failed to record notification for transport"
                );
            }
        }
    }
}
