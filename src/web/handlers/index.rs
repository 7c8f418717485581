use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Service index returned from `/`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceIndex {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
    pub documentation: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service index",
    responses(
        (status = 200, description = "Endpoint directory", body = ServiceIndex)
    )
)]
pub async fn index() -> Json<ServiceIndex> {
    let endpoints = [
        ("search", "/api/search-emotes"),
        ("trending_emotes", "/api/trending/emotes"),
        ("storage_trending", "/api/storage/trending-emotes"),
        ("storage_emotes", "/api/storage/emote-api"),
        ("cache_status", "/api/cache/status"),
        ("clear_cache", "/api/cache/clear"),
        ("health", "/health"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(ServiceIndex {
        message: "Welcome to the 7TV Emote API".to_string(),
        endpoints,
        documentation: "/api/openapi.json".to_string(),
    })
}
