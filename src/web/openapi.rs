//! OpenAPI documentation generated from the handler annotations

use axum::Json;
use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Emote Proxy API",
        description = "Caching and archival proxy for 7TV emote search and trending listings. \
                       Every emote returned has been copied into object storage and is served \
                       from there."
    ),
    paths(
        handlers::index::index,
        handlers::health::health_check,
        handlers::emotes::search_emotes,
        handlers::trending::trending_emotes,
        handlers::storage::list_trending_storage,
        handlers::storage::list_search_storage,
        handlers::cache::cache_status,
        handlers::cache::clear_cache,
    ),
    components(schemas(
        crate::models::SearchResult,
        super::responses::ApiResponse,
        crate::models::ArchivedEmote,
        crate::models::AnimationFilter,
        crate::models::TrendingPeriod,
        crate::models::CacheClass,
        crate::services::response_cache::CacheStatus,
        crate::services::response_cache::CacheClearReport,
        super::extractors::SearchRequestBody,
        handlers::cache::CacheClearResponse,
        handlers::health::HealthResponse,
        handlers::health::DependencyHealth,
        handlers::index::ServiceIndex,
    )),
    tags(
        (name = "emotes", description = "Catalog search"),
        (name = "trending", description = "Live trending rankings"),
        (name = "storage", description = "Archived emote listings"),
        (name = "cache", description = "Response cache administration"),
        (name = "health", description = "Service health and index"),
    )
)]
pub struct ApiDoc;

/// Serve the generated document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
