//! HTTP handler modules.

pub(crate) mod articles;
pub(crate) mod generate;

use axum::{extract::State, Json};
use serde_json::json;

use crate::AppState;

/// Service banner.
pub(crate) async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "TruthSync generation service is running" }))
}

/// Health check: process liveness plus vision backend reachability.
pub(crate) async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let model_reachable = state.backend.health_check().await.unwrap_or(false);
    Json(json!({
        "status": "healthy",
        "model": state.model,
        "model_reachable": model_reachable,
    }))
}
