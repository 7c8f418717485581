//! Listings of what has already been archived

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, StatusCode},
    response::Response,
};

use crate::models::StorageFolder;
use crate::services::emote_search::StorageListing;
use crate::web::{
    AppState,
    extractors::{RequestContext, StoragePageParams},
    responses::{listing, listing_with_status},
    utils::log_request,
};

/// Archived trending emotes
#[utoipa::path(
    get,
    path = "/api/storage/trending-emotes",
    tag = "storage",
    summary = "List archived trending emotes",
    params(StoragePageParams),
    responses(
        (status = 200, description = "One page of the trending archive", body = crate::models::SearchResult),
        (status = 500, description = "Object storage listing failed", body = crate::models::SearchResult)
    )
)]
pub async fn list_trending_storage(
    State(state): State<AppState>,
    context: RequestContext,
    params: Result<Query<StoragePageParams>, QueryRejection>,
) -> Response {
    log_request(&Method::GET, "/api/storage/trending-emotes", &context);
    list_folder(&state, StorageFolder::TrendingEmotes, params).await
}

/// Archived search results
#[utoipa::path(
    get,
    path = "/api/storage/emote-api",
    tag = "storage",
    summary = "List archived search emotes",
    params(StoragePageParams),
    responses(
        (status = 200, description = "One page of the search archive", body = crate::models::SearchResult),
        (status = 500, description = "Object storage listing failed", body = crate::models::SearchResult)
    )
)]
pub async fn list_search_storage(
    State(state): State<AppState>,
    context: RequestContext,
    params: Result<Query<StoragePageParams>, QueryRejection>,
) -> Response {
    log_request(&Method::GET, "/api/storage/emote-api", &context);
    list_folder(&state, StorageFolder::EmoteApi, params).await
}

async fn list_folder(
    state: &AppState,
    folder: StorageFolder,
    params: Result<Query<StoragePageParams>, QueryRejection>,
) -> Response {
    // Unparseable query strings fall back to defaults like unparseable numbers do
    let params = params.map(|Query(p)| p).unwrap_or_default();

    match state
        .emotes
        .list_storage(folder, params.page(), params.limit())
        .await
    {
        StorageListing::Listed(result) => listing(result),
        StorageListing::Failed(result) => {
            tracing::error!(%folder, "Storage listing failed: {:?}", result.message);
            listing_with_status(StatusCode::INTERNAL_SERVER_ERROR, result)
        }
    }
}
