//! # Execution Handlers
//!
//! Task submission and ledger projections. Submission is asynchronous:
//! callers receive the execution id immediately and poll for the terminal
//! outcome.

use crate::models::{Execution, TaskType};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission payload; fields are validated by hand so every missing field
/// yields a 400 with a descriptive error instead of a deserializer rejection
#[derive(Debug, Deserialize)]
pub struct SubmitExecutionRequest {
    pub task_type: Option<String>,
    pub team_id: Option<String>,
    pub provider_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitExecutionResponse {
    pub execution_id: Uuid,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing required field: {field}")))
}

fn parse_uuid(value: &str, field: &str) -> ApiResult<Uuid> {
    value
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid {field}: {value}")))
}

/// Submit a task: POST /v1/executions
pub async fn submit_execution(
    State(state): State<AppState>,
    Json(request): Json<SubmitExecutionRequest>,
) -> ApiResult<(StatusCode, Json<SubmitExecutionResponse>)> {
    let task_type: TaskType = required(&request.task_type, "task_type")?
        .parse()
        .map_err(ApiError::bad_request)?;
    let team_id = parse_uuid(required(&request.team_id, "team_id")?, "team_id")?;
    let provider_id = parse_uuid(required(&request.provider_id, "provider_id")?, "provider_id")?;

    let execution = state
        .orchestrator
        .submit(task_type, team_id, provider_id)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitExecutionResponse {
            execution_id: execution.execution_id,
        }),
    ))
}

/// Read one ledger row: GET /v1/executions/{execution_id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<Uuid>,
) -> ApiResult<Json<Execution>> {
    let execution = state
        .stores
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("execution {execution_id} not found")))?;
    Ok(Json(execution))
}
