use axum::{extract::Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
    active_polling: usize,
}

/// Health check endpoint
///
/// Reports the number of searches still being polled.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let health = state.service.health();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        active_polling: health.active_job_count,
    })
}
