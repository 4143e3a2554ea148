//! # Web API
//!
//! HTTP surface for task submission, ledger projections, and reconciliation
//! triggers. All state-changing endpoints are POST-only; other methods get
//! a 405 from the router.

pub mod errors;
pub mod handlers;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/v1/executions", post(handlers::executions::submit_execution))
        .route(
            "/v1/executions/{execution_id}",
            get(handlers::executions::get_execution),
        )
        .route(
            "/v1/discovery/reconcile",
            post(handlers::discovery::trigger_reconciliation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
