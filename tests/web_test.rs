//! HTTP API tests driven through the router with `tower::ServiceExt`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{deployment_fact, resource_fact, MockAdapter, TestEnv};
use fleetops_core::config::FleetConfig;
use fleetops_core::discovery::DiscoveryReconciler;
use fleetops_core::orchestration::TaskOrchestrator;
use fleetops_core::web::{self, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn build_app(env: &TestEnv) -> Router {
    let config = FleetConfig {
        worker_count: 1,
        queue_capacity: 8,
        ..FleetConfig::default()
    };
    let orchestrator = Arc::new(TaskOrchestrator::start(
        &config,
        env.stores.clone(),
        env.registry.clone(),
        env.events.clone(),
    ));
    let reconciler = Arc::new(DiscoveryReconciler::new(
        env.stores.clone(),
        env.registry.clone(),
        env.events.clone(),
    ));
    web::router(AppState::new(
        orchestrator,
        reconciler,
        env.stores.clone(),
        env.registry.clone(),
    ))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_submit_execution_returns_accepted() {
    let env = TestEnv::new();
    let provider = env.seed_provider("aws");
    env.seed_credential(&provider);
    env.registry.register(Arc::new(
        MockAdapter::new("aws").with_facts(vec![resource_fact("i-1", "web")]),
    ));
    let app = build_app(&env);

    let response = app
        .oneshot(post_json(
            "/v1/executions",
            json!({
                "task_type": "inventory",
                "team_id": env.team_id,
                "provider_id": provider.provider_id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    let execution_id: Uuid = body["execution_id"].as_str().unwrap().parse().unwrap();
    assert!(!execution_id.is_nil());
}

#[tokio::test]
async fn test_submit_execution_missing_field_is_rejected() {
    let env = TestEnv::new();
    let app = build_app(&env);

    let response = app
        .oneshot(post_json(
            "/v1/executions",
            json!({ "task_type": "inventory", "team_id": env.team_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "missing required field: provider_id");
}

#[tokio::test]
async fn test_submit_execution_invalid_task_type_is_rejected() {
    let env = TestEnv::new();
    let app = build_app(&env);

    let response = app
        .oneshot(post_json(
            "/v1/executions",
            json!({
                "task_type": "restore",
                "team_id": env.team_id,
                "provider_id": Uuid::new_v4(),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_execution_is_not_found() {
    let env = TestEnv::new();
    let app = build_app(&env);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/executions/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_get_on_submission_route_is_method_not_allowed() {
    let env = TestEnv::new();
    let app = build_app(&env);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/executions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_reconcile_reports_sync_results() {
    let env = TestEnv::new();
    let provider = env.seed_provider("docker");
    env.seed_credential(&provider);
    env.seed_application("frontend");
    env.registry.register(Arc::new(
        MockAdapter::new("docker").with_deployments(vec![deployment_fact(
            "frontend", "c-1", "staging",
        )]),
    ));
    let app = build_app(&env);

    let response = app
        .oneshot(post_json(
            "/v1/discovery/reconcile",
            json!({ "team_id": env.team_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["discoveries_count"], 1);
    assert_eq!(body["sync_results"]["created"], 1);
    assert_eq!(body["sync_results"]["updated"], 0);
    assert_eq!(body["sync_results"]["errors"], 0);
    assert!(body["message"].as_str().unwrap().contains("created=1"));
}

#[tokio::test]
async fn test_reconcile_without_team_is_rejected() {
    let env = TestEnv::new();
    let app = build_app(&env);

    let response = app
        .oneshot(post_json("/v1/discovery/reconcile", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "missing required field: team_id");
}

#[tokio::test]
async fn test_health_reports_registered_providers() {
    let env = TestEnv::new();
    env.registry.register(Arc::new(MockAdapter::new("aws")));
    let app = build_app(&env);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["workers"], 1);
    assert_eq!(body["registered_providers"][0], "aws");
}
