//! Liveness probe.

use crate::web::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "registered_providers": state.registry.provider_names(),
        "workers": state.orchestrator.worker_count(),
    }))
}
