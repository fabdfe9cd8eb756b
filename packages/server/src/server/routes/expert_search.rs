use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::CallId;
use crate::domains::expert_search::SubmitRequest;
use crate::kernel::jobs::JobContext;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Header carrying a caller-chosen call id.
pub const CALL_ID_HEADER: &str = "x-call-id";

#[derive(Debug, Default, Deserialize)]
pub struct ExpertSearchBody {
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub user_first_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpertSearchResponse {
    pub success: bool,
    pub message: String,
    pub search_id: String,
    pub call_id: CallId,
}

fn parse_project_id(raw: Option<String>) -> Result<Option<Uuid>, ApiError> {
    match raw.filter(|s| !s.is_empty()) {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| ApiError::InvalidProjectId(raw)),
        None => Ok(None),
    }
}

/// Start an expert search. Polling continues in the background after the
/// response is sent.
pub async fn expert_search_handler(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(body): Json<ExpertSearchBody>,
) -> Result<Json<ExpertSearchResponse>, ApiError> {
    let call_id = headers
        .get(CALL_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CallId::parse);

    let request = SubmitRequest {
        query: body.search_query,
        user_name: body.user_first_name,
        project_id: parse_project_id(body.project_id)?,
        call_id,
    };

    let ack = state.service.submit(request).await?;

    Ok(Json(ExpertSearchResponse {
        success: true,
        message: "Search initiated successfully".to_string(),
        search_id: ack.remote_job_id,
        call_id: ack.call_id,
    }))
}

/// Current state of one search: active, or completed and retained.
pub async fn expert_search_job_handler(
    Path(call_id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<JobContext>, ApiError> {
    state
        .service
        .job(&CallId::from(call_id.as_str()))
        .map(Json)
        .ok_or(ApiError::JobNotFound(call_id))
}
