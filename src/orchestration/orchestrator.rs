//! # Task Orchestrator
//!
//! Accepts task submissions, records them on the execution ledger in
//! `pending`, and hands them to a bounded worker pool over an mpsc queue.
//! The submitting caller gets the execution id back immediately and observes
//! the outcome asynchronously through the ledger and notifications.
//!
//! Concurrency limits and backpressure are explicit: the queue capacity
//! bounds accepted-but-unprocessed work and the worker count bounds provider
//! calls in flight. Resubmitting the same `(team, provider, task_type)`
//! creates a new independent execution; overlapping runs are not coalesced.

use super::executor::ExecutionRunner;
use crate::config::FleetConfig;
use crate::constants::events;
use crate::error::{FleetError, Result};
use crate::events::EventPublisher;
use crate::models::{Execution, NewExecution, TaskType};
use crate::registry::AdapterRegistry;
use crate::storage::Stores;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

pub struct TaskOrchestrator {
    stores: Stores,
    events: EventPublisher,
    queue: mpsc::Sender<Uuid>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskOrchestrator {
    /// Build the orchestrator and spawn its worker pool
    pub fn start(
        config: &FleetConfig,
        stores: Stores,
        registry: Arc<AdapterRegistry>,
        events: EventPublisher,
    ) -> Self {
        let (queue, receiver) = mpsc::channel::<Uuid>(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let runner = Arc::new(ExecutionRunner::new(
            stores.clone(),
            registry,
            events.clone(),
            Duration::from_millis(config.adapter_timeout_ms),
        ));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let receiver = receiver.clone();
            let runner = runner.clone();
            workers.push(tokio::spawn(async move {
                debug!(worker_id, "Orchestration worker started");
                loop {
                    let next = { receiver.lock().await.recv().await };
                    match next {
                        Some(execution_id) => runner.run(execution_id).await,
                        None => break,
                    }
                }
                debug!(worker_id, "Orchestration worker stopped");
            }));
        }

        info!(
            workers = config.worker_count,
            queue_capacity = config.queue_capacity,
            "🚀 ORCHESTRATOR: Worker pool started"
        );

        Self {
            stores,
            events,
            queue,
            workers,
        }
    }

    /// Enqueue one task. Creates the ledger entry in `pending` and returns
    /// it before any processing happens; callers poll the ledger (or watch
    /// notifications) for the terminal outcome.
    pub async fn submit(
        &self,
        task_type: TaskType,
        team_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Execution> {
        let execution = self
            .stores
            .executions
            .create(NewExecution {
                team_id,
                provider_id,
                task_type,
            })
            .await?;

        self.events.publish(
            events::EXECUTION_SUBMITTED,
            json!({
                "execution_id": execution.execution_id,
                "team_id": team_id,
                "provider_id": provider_id,
                "task_type": task_type,
            }),
        );

        self.queue
            .send(execution.execution_id)
            .await
            .map_err(|_| {
                FleetError::OrchestrationError("submission queue is closed".to_string())
            })?;

        info!(
            execution_id = %execution.execution_id,
            team_id = %team_id,
            task_type = %task_type,
            "📋 Task submitted"
        );
        Ok(execution)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
