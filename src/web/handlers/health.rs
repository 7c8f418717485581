//! Health check HTTP handler
//!
//! The process is healthy as long as it answers; the state of the cache
//! store and object storage is reported alongside for operators.

use axum::{Json, extract::State, http::Method};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::web::{AppState, extractors::RequestContext, utils::log_request};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DependencyHealth {
    pub backend: String,
    /// Cache: `connected` or `disconnected` after a ping.
    /// Storage: `configured` or `disabled`, without contacting the backend.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub catalog: String,
    pub cache: DependencyHealth,
    pub storage: DependencyHealth,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(state): State<AppState>,
    context: RequestContext,
) -> Json<HealthResponse> {
    log_request(&Method::GET, "/health", &context);

    let cache = state.emotes.cache();
    let cache_health = DependencyHealth {
        backend: cache.backend_name().to_string(),
        status: if cache.is_reachable().await {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
    };

    let storage_health = match state.emotes.archiver().storage() {
        Some(storage) => DependencyHealth {
            backend: storage.backend_name().to_string(),
            status: "configured".to_string(),
        },
        None => DependencyHealth {
            backend: "none".to_string(),
            status: "disabled".to_string(),
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        catalog: state.emotes.catalog_name().to_string(),
        cache: cache_health,
        storage: storage_health,
    })
}
