use crate::error::AppResult;
use crate::routes::types::HealthCheckResponse;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        links: state.store.len(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now(),
    };

    Ok(Json(response))
}
