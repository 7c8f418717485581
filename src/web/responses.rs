//! HTTP response types and utilities
//!
//! Emote listings are served as bare [`SearchResult`] bodies. Everything
//! else, including every rejected request, uses the [`ApiResponse`] envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::SearchResult;

/// Envelope for rejected and failed requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    /// Always `false`
    pub success: bool,
    /// Error message
    pub error: String,
    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Serve an emote listing with 200
pub fn listing(result: SearchResult) -> Response {
    (StatusCode::OK, Json(result)).into_response()
}

/// Serve an emote listing with an explicit status
pub fn listing_with_status(status: StatusCode, result: SearchResult) -> Response {
    (status, Json(result)).into_response()
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match &error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::Cache(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Cache error: {e}"),
        ),
        AppError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    } else {
        tracing::debug!("Request rejected: {}", error);
    }

    (status, Json(ApiResponse::error(message))).into_response()
}

/// Create a bad request error response
pub fn bad_request(message: &str) -> Response {
    handle_error(AppError::validation(message))
}
