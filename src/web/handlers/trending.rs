//! Live trending handler

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::Method,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::web::{
    AppState,
    extractors::{RequestContext, TrendingParams},
    responses::{bad_request, handle_error, listing},
    utils::log_request,
};

/// Page through the upstream trending ranking, archiving the requested page
#[utoipa::path(
    get,
    path = "/api/trending/emotes",
    tag = "trending",
    summary = "Trending emotes",
    params(TrendingParams),
    responses(
        (status = 200, description = "One page of trending emotes", body = crate::models::SearchResult),
        (status = 400, description = "Invalid period or emote_type")
    )
)]
pub async fn trending_emotes(
    State(state): State<AppState>,
    context: RequestContext,
    params: Result<Query<TrendingParams>, QueryRejection>,
) -> Response {
    log_request(&Method::GET, "/api/trending/emotes", &context);

    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let query = match params.into_query() {
        Ok(query) => query,
        Err(e) => return handle_error(e),
    };

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    listing(state.emotes.trending(query, cancel).await)
}
