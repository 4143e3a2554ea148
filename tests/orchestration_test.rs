//! End-to-end orchestration tests against the in-memory backend: submission,
//! lifecycle transitions, adapter dispatch, result persistence, and
//! notification fan-out.

mod common;

use common::{resource_fact, MockAdapter, TestEnv};
use fleetops_core::config::FleetConfig;
use fleetops_core::models::{NewExecution, NotificationKind, TaskType};
use fleetops_core::orchestration::TaskOrchestrator;
use fleetops_core::state_machine::ExecutionState;
use fleetops_core::storage::{BackupJobStore, ExecutionStore, NotificationStore, ResourceStore};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

async fn create_execution(env: &TestEnv, task_type: TaskType, provider_id: Uuid) -> Uuid {
    let execution = env
        .stores
        .executions
        .create(NewExecution {
            team_id: env.team_id,
            provider_id,
            task_type,
        })
        .await
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Pending);
    execution.execution_id
}

#[tokio::test]
async fn test_inventory_execution_completes_and_fills_catalog() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.seed_credential(&provider);
    env.seed_transport("ops-webhook");
    env.registry.register(Arc::new(
        MockAdapter::new("aws").with_facts(vec![
            resource_fact("i-001", "web-1"),
            resource_fact("i-002", "web-2"),
        ]),
    ));

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner().run(execution_id).await;

    let execution = env
        .stores
        .executions
        .get(execution_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Completed);
    assert!(execution.started_at.is_some());
    assert!(execution.finished_at.is_some());
    assert!(execution.error_message.is_none());

    let result = execution.result.unwrap();
    assert_eq!(result["discovered"], 2);
    assert_eq!(result["created"], 2);
    assert_eq!(result["updated"], 0);

    let resources = env
        .stores
        .resources
        .list_for_provider(env.team_id, provider.provider_id)
        .await
        .unwrap();
    assert_eq!(resources.len(), 2);

    let notifications = env
        .stores
        .notifications
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Success);
    assert!(notifications[0].message.contains("2 assets discovered"));
}

#[tokio::test]
async fn test_repeated_inventory_updates_instead_of_duplicating() {
    let env = TestEnv::new();
    let provider = env.seed_provider("gcp");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(
        MockAdapter::new("gcp").with_facts(vec![resource_fact("vm-1", "api")]),
    ));
    let runner = env.runner();

    let first = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    runner.run(first).await;
    let second = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    runner.run(second).await;

    let execution = env.stores.executions.get(second).await.unwrap().unwrap();
    let result = execution.result.unwrap();
    assert_eq!(result["created"], 0);
    assert_eq!(result["updated"], 1);

    let resources = env
        .stores
        .resources
        .list_for_provider(env.team_id, provider.provider_id)
        .await
        .unwrap();
    assert_eq!(resources.len(), 1);
}

#[tokio::test]
async fn test_backup_continues_past_failing_resource() {
    let env = TestEnv::new();
    let provider = env.seed_provider("azure");
    env.seed_credential(&provider);
    env.seed_transport("ops-webhook");
    env.registry.register(Arc::new(
        MockAdapter::new("azure")
            .with_facts(vec![
                resource_fact("vm-a", "db-primary"),
                resource_fact("vm-b", "db-replica"),
                resource_fact("vm-c", "cache"),
            ])
            .failing_snapshot("db-replica"),
    ));
    let runner = env.runner();

    let inventory = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    runner.run(inventory).await;

    let backup = create_execution(&env, TaskType::Backup, provider.provider_id).await;
    runner.run(backup).await;

    let execution = env.stores.executions.get(backup).await.unwrap().unwrap();
    assert_eq!(execution.state, ExecutionState::Completed);
    let result = execution.result.unwrap();
    assert_eq!(result["total"], 3);
    assert_eq!(result["succeeded"], 2);
    assert_eq!(result["failed"], 1);

    // Only the successful snapshots leave audit rows
    let jobs = env
        .stores
        .backup_jobs
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);

    let notifications = env
        .stores
        .notifications
        .list_for_team(env.team_id)
        .await
        .unwrap();
    let backup_note = notifications
        .iter()
        .find(|n| n.message.contains("backup finished"))
        .unwrap();
    assert_eq!(backup_note.kind, NotificationKind::Success);
    assert!(backup_note.message.contains("succeeded=2"));
    assert!(backup_note.message.contains("failed=1"));
}

#[tokio::test]
async fn test_unsupported_provider_fails_execution() {
    let env = TestEnv::new();
    let provider = env.seed_provider("openstack");
    env.seed_credential(&provider);
    env.seed_transport("ops-webhook");

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner().run(execution_id).await;

    let execution = env
        .stores
        .executions
        .get(execution_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Failed);
    let message = execution.error_message.unwrap();
    assert!(message.contains("openstack"));

    let notifications = env
        .stores
        .notifications
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Failure);
    assert!(notifications[0].message.contains("inventory task failed"));
}

#[tokio::test]
async fn test_missing_credential_fails_execution() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.registry.register(Arc::new(MockAdapter::new("aws")));

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner().run(execution_id).await;

    let execution = env
        .stores
        .executions
        .get(execution_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Failed);
    assert!(execution
        .error_message
        .unwrap()
        .contains("Credential not found"));
}

#[tokio::test]
async fn test_adapter_discovery_error_fails_execution() {
    let env = TestEnv::new();
    let provider = env.seed_provider("gcp");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(
        MockAdapter::new("gcp").failing_discovery("token expired"),
    ));

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner().run(execution_id).await;

    let execution = env
        .stores
        .executions
        .get(execution_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Failed);
    assert!(execution.error_message.unwrap().contains("token expired"));
}

#[tokio::test]
async fn test_slow_adapter_call_times_out_and_fails_execution() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.seed_credential(&provider);
    env.seed_transport("ops-webhook");
    env.registry.register(Arc::new(
        MockAdapter::new("aws")
            .with_facts(vec![resource_fact("i-001", "web-1")])
            .with_delay(Duration::from_secs(10)),
    ));

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner_with_timeout(Duration::from_millis(50))
        .run(execution_id)
        .await;

    let execution = env
        .stores
        .executions
        .get(execution_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Failed);
    assert!(execution.result.is_none());
    let message = execution.error_message.unwrap();
    assert!(message.contains("timed out after 50ms"), "got: {message}");

    let notifications = env
        .stores
        .notifications
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Failure);
    assert!(notifications[0].message.contains("inventory task failed"));
}

#[tokio::test]
async fn test_terminal_executions_reject_further_transitions() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(MockAdapter::new("aws")));

    let execution_id = create_execution(&env, TaskType::Inventory, provider.provider_id).await;
    env.runner().run(execution_id).await;

    let result = env
        .stores
        .executions
        .transition(execution_id, ExecutionState::Running, None, None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_orchestrator_drives_submission_to_terminal_state() {
    let env = TestEnv::new();
    let provider = env.seed_provider("docker");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(
        MockAdapter::new("docker").with_facts(vec![resource_fact("c-1", "worker")]),
    ));

    let config = FleetConfig {
        worker_count: 2,
        queue_capacity: 8,
        ..FleetConfig::default()
    };
    let orchestrator = TaskOrchestrator::start(
        &config,
        env.stores.clone(),
        env.registry.clone(),
        env.events.clone(),
    );
    assert_eq!(orchestrator.worker_count(), 2);

    let execution = orchestrator
        .submit(TaskType::Inventory, env.team_id, provider.provider_id)
        .await
        .unwrap();
    assert_eq!(execution.state, ExecutionState::Pending);

    let mut state = ExecutionState::Pending;
    for _ in 0..100 {
        let current = env
            .stores
            .executions
            .get(execution.execution_id)
            .await
            .unwrap()
            .unwrap();
        state = current.state;
        if state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state, ExecutionState::Completed);
}
