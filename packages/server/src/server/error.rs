//! JSON error responses for the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::expert_search::SubmitError;

/// Structured JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("project_id must be a UUID")]
    InvalidProjectId(String),

    #[error("No search found for call id {0}")]
    JobNotFound(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Submit(SubmitError::MissingQuery) => StatusCode::BAD_REQUEST,
            ApiError::Submit(SubmitError::Initiation {
                status: Some(status),
                ..
            }) => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Submit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidProjectId(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Submit(SubmitError::Initiation { details, .. }) => Some(details.clone()),
            ApiError::InvalidProjectId(raw) => Some(raw.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
