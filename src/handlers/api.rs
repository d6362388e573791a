use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness check. Answers without touching the upstream services.
pub async fn health_check(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "OK" })
}
