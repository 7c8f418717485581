//! Emote search handler

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::Method,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::web::{
    AppState,
    extractors::{RequestContext, SearchRequestBody},
    responses::{bad_request, handle_error, listing},
    utils::log_request,
};

/// Search the catalog by name and archive the matches
#[utoipa::path(
    post,
    path = "/api/search-emotes",
    tag = "emotes",
    summary = "Search emotes",
    description = "Search the upstream catalog, archive the best variant of each match and return the archived records",
    request_body = SearchRequestBody,
    responses(
        (status = 200, description = "Search results", body = crate::models::SearchResult),
        (status = 400, description = "Missing query, invalid emote_type or malformed body")
    )
)]
pub async fn search_emotes(
    State(state): State<AppState>,
    context: RequestContext,
    body: Result<Json<SearchRequestBody>, JsonRejection>,
) -> Response {
    log_request(&Method::POST, "/api/search-emotes", &context);

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let query = match body.into_query() {
        Ok(query) => query,
        Err(e) => return handle_error(e),
    };

    // Cancelled when this future ends or is dropped by the request timeout
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    listing(state.emotes.search(query, cancel).await)
}
