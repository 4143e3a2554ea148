//! Deployment reconciliation tests: natural-key convergence, unknown
//! application handling, and per-provider error isolation.

mod common;

use common::{deployment_fact, MockAdapter, TestEnv};
use fleetops_core::discovery::DiscoveryReconciler;
use fleetops_core::storage::DeploymentStore;
use std::sync::Arc;

fn reconciler(env: &TestEnv) -> DiscoveryReconciler {
    DiscoveryReconciler::new(env.stores.clone(), env.registry.clone(), env.events.clone())
}

#[tokio::test]
async fn test_repeated_reconciliation_converges_on_one_row() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.seed_credential(&provider);
    env.seed_application("billing-api");
    env.registry.register(Arc::new(
        MockAdapter::new("aws").with_deployments(vec![deployment_fact(
            "billing-api",
            "i-100",
            "production",
        )]),
    ));
    let reconciler = reconciler(&env);

    let first = reconciler.reconcile(env.team_id, None).await.unwrap();
    assert_eq!(first.created, 1);
    assert_eq!(first.updated, 0);
    assert_eq!(first.errors, 0);
    assert_eq!(first.discoveries.len(), 1);

    let second = reconciler.reconcile(env.team_id, None).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 1);
    assert_eq!(second.errors, 0);

    let deployments = env
        .stores
        .deployments
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].environment_name, "production");
    assert_eq!(deployments[0].version.as_deref(), Some("1.0.0"));

    // The natural-key projection resolves the same row both runs converged on
    let found = env
        .stores
        .deployments
        .find_by_natural_key(env.team_id, &deployments[0].natural_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.deployment_id, deployments[0].deployment_id);
}

#[tokio::test]
async fn test_update_rewrites_mutable_fields_in_place() {
    let env = TestEnv::new();
    let provider = env.seed_provider("docker");
    env.seed_credential(&provider);
    env.seed_application("frontend");
    let reconciler = reconciler(&env);

    env.registry.register(Arc::new(
        MockAdapter::new("docker").with_deployments(vec![deployment_fact(
            "frontend", "c-9", "staging",
        )]),
    ));
    reconciler.reconcile(env.team_id, None).await.unwrap();

    let mut updated_fact = deployment_fact("frontend", "c-9", "staging");
    updated_fact.version = Some("2.0.0".to_string());
    updated_fact.status = "stopped".to_string();
    env.registry
        .register(Arc::new(MockAdapter::new("docker").with_deployments(vec![updated_fact])));
    let report = reconciler.reconcile(env.team_id, None).await.unwrap();
    assert_eq!(report.updated, 1);

    let deployments = env
        .stores
        .deployments
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].version.as_deref(), Some("2.0.0"));
    assert_eq!(deployments[0].status, "stopped");
}

#[tokio::test]
async fn test_unknown_application_is_skipped_without_error() {
    let env = TestEnv::new();
    let provider = env.seed_provider("gcp");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(
        MockAdapter::new("gcp").with_deployments(vec![deployment_fact(
            "unregistered-app",
            "vm-7",
            "production",
        )]),
    ));

    let report = reconciler(&env).reconcile(env.team_id, None).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors, 0);
    // The fact still shows up in the discovery set
    assert_eq!(report.discoveries.len(), 1);

    let deployments = env
        .stores
        .deployments
        .list_for_team(env.team_id)
        .await
        .unwrap();
    assert!(deployments.is_empty());
}

#[tokio::test]
async fn test_failing_provider_does_not_block_others() {
    let env = TestEnv::new();
    let aws = env.seed_provider("aws");
    let gcp = env.seed_provider("gcp");
    env.seed_credential(&aws);
    env.seed_credential(&gcp);
    env.seed_application("billing-api");
    env.registry.register(Arc::new(
        MockAdapter::new("aws").failing_discovery("region unreachable"),
    ));
    env.registry.register(Arc::new(
        MockAdapter::new("gcp").with_deployments(vec![deployment_fact(
            "billing-api",
            "vm-3",
            "production",
        )]),
    ));

    let report = reconciler(&env).reconcile(env.team_id, None).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn test_provider_scope_limits_reconciliation() {
    let env = TestEnv::new();
    let aws = env.seed_provider("aws");
    let docker = env.seed_provider("docker");
    env.seed_credential(&aws);
    env.seed_credential(&docker);
    env.seed_application("billing-api");
    env.registry.register(Arc::new(
        MockAdapter::new("aws").with_deployments(vec![deployment_fact(
            "billing-api",
            "i-1",
            "production",
        )]),
    ));
    env.registry.register(Arc::new(
        MockAdapter::new("docker").with_deployments(vec![deployment_fact(
            "billing-api",
            "c-1",
            "staging",
        )]),
    ));

    let report = reconciler(&env)
        .reconcile(env.team_id, Some("aws"))
        .await
        .unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.discoveries.len(), 1);
    assert_eq!(report.discoveries[0].cloud_asset_id, "i-1");
}

#[tokio::test]
async fn test_credential_without_adapter_counts_as_error() {
    let env = TestEnv::new();
    let provider = env.seed_provider("openstack");
    env.seed_credential(&provider);

    let report = reconciler(&env).reconcile(env.team_id, None).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(report.created, 0);
}
