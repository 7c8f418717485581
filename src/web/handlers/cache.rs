//! Cache administration handlers

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::Method,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::response_cache::{CacheClearReport, CacheStatus};
use crate::web::{
    AppState,
    extractors::{CacheClearParams, RequestContext},
    responses::{bad_request, handle_error},
    utils::log_request,
};

/// Response of the administrative clear
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheClearResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: CacheClearReport,
}

/// Snapshot of the response cache
///
/// Always answers 200; an unreachable store is reported as `status: error`.
#[utoipa::path(
    get,
    path = "/api/cache/status",
    tag = "cache",
    summary = "Cache status",
    responses(
        (status = 200, description = "Cache status snapshot", body = CacheStatus)
    )
)]
pub async fn cache_status(State(state): State<AppState>, context: RequestContext) -> Response {
    log_request(&Method::GET, "/api/cache/status", &context);
    Json(state.emotes.cache().status().await).into_response()
}

/// Drop cached listings by class
#[utoipa::path(
    post,
    path = "/api/cache/clear",
    tag = "cache",
    summary = "Clear cache",
    params(CacheClearParams),
    responses(
        (status = 200, description = "Cache cleared", body = CacheClearResponse),
        (status = 400, description = "Invalid cache_type"),
        (status = 500, description = "Cache store unreachable")
    )
)]
pub async fn clear_cache(
    State(state): State<AppState>,
    context: RequestContext,
    params: Result<Query<CacheClearParams>, QueryRejection>,
) -> Response {
    log_request(&Method::POST, "/api/cache/clear", &context);

    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let class = match params.class() {
        Ok(class) => class,
        Err(e) => return handle_error(e),
    };

    match state.emotes.cache().clear(class).await {
        Ok(report) => {
            tracing::info!(
                %class,
                total_removed = report.total_removed,
                request_id = %context.request_id,
                "Cache cleared"
            );
            Json(CacheClearResponse {
                success: true,
                message: format!("Cache cleared. {} entries removed.", report.total_removed),
                report,
            })
            .into_response()
        }
        Err(e) => handle_error(AppError::Cache(e)),
    }
}
