//! Reconciliation trigger endpoint.

use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub team_id: Option<String>,
    /// Optional provider family filter (internal provider name);
    /// defaults to all providers with active credentials
    pub provider_type: Option<String>,
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Trigger reconciliation: POST /v1/discovery/reconcile
pub async fn trigger_reconciliation(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> Response {
    let Some(team_id) = request.team_id.as_deref().filter(|v| !v.is_empty()) else {
        return failure(
            StatusCode::BAD_REQUEST,
            "missing required field: team_id".to_string(),
        );
    };
    let team_id: Uuid = match team_id.parse() {
        Ok(team_id) => team_id,
        Err(_) => {
            return failure(
                StatusCode::BAD_REQUEST,
                format!("invalid team_id: {team_id}"),
            )
        }
    };

    match state
        .reconciler
        .reconcile(team_id, request.provider_type.as_deref())
        .await
    {
        Ok(report) => Json(json!({
            "success": true,
            "discoveries_count": report.discoveries.len(),
            "sync_results": {
                "created": report.created,
                "updated": report.updated,
                "errors": report.errors,
            },
            "message": report.message(),
        }))
        .into_response(),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
