//! 7TV GraphQL catalog client
//!
//! Two queries are issued against the v4 GraphQL API: the emote search with
//! its typed `filters` argument, and the older `emotes(...)` listing sorted by
//! a trending period. Trending items describe their files relative to a CDN
//! host, so they are expanded into full image variants here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::traits::CatalogSource;
use crate::config::UpstreamConfig;
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::models::{AnimationFilter, CatalogEntry, ImageVariant, MimeType, TrendingPeriod};

const SEARCH_QUERY: &str = r#"
query EmoteSearch($query: String, $tags: [String!]!, $sortBy: SortBy!, $filters: Filters, $page: Int, $perPage: Int!) {
  emotes {
    search(
      query: $query
      tags: { tags: $tags, match: ANY }
      sort: { sortBy: $sortBy, order: DESCENDING }
      filters: $filters
      page: $page
      perPage: $perPage
    ) {
      items {
        id
        defaultName
        owner {
          mainConnection {
            platformDisplayName
          }
        }
        images {
          url
          mime
          size
          scale
          width
          frameCount
        }
        ranking(ranking: TRENDING_WEEKLY)
      }
      totalCount
      pageCount
    }
  }
}
"#;

const TRENDING_QUERY: &str = r#"
query GetTrendingEmotes($limit: Int, $filter: EmoteSearchFilter, $period: String!) {
  emotes(query: "", limit: $limit, filter: $filter, sort: { value: $period, order: DESCENDING }) {
    items {
      id
      name
      animated
      host {
        url
        files {
          name
          format
          width
          height
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    emotes: SearchEmotes,
}

#[derive(Debug, Deserialize)]
struct SearchEmotes {
    search: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    id: String,
    default_name: String,
    #[serde(default)]
    owner: Option<SearchOwner>,
    #[serde(default)]
    images: Vec<SearchImage>,
    #[serde(default)]
    ranking: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchOwner {
    #[serde(default)]
    main_connection: Option<MainConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MainConnection {
    #[serde(default)]
    platform_display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchImage {
    url: String,
    mime: String,
    #[serde(default)]
    scale: u32,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    frame_count: u32,
}

#[derive(Debug, Deserialize)]
struct TrendingData {
    emotes: TrendingEmotes,
}

#[derive(Debug, Deserialize)]
struct TrendingEmotes {
    #[serde(default)]
    items: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    id: String,
    name: String,
    #[serde(default)]
    animated: bool,
    host: TrendingHost,
}

#[derive(Debug, Deserialize)]
struct TrendingHost {
    url: String,
    #[serde(default)]
    files: Vec<TrendingFile>,
}

#[derive(Debug, Deserialize)]
struct TrendingFile {
    name: String,
    format: String,
    #[serde(default)]
    width: u32,
}

/// Catalog client for the 7TV GraphQL API
pub struct SevenTvClient {
    client: Client,
    search_url: String,
    trending_url: String,
}

impl SevenTvClient {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            trending_url: config.trending_url.clone(),
        })
    }

    /// Run the search query and map the items, without swallowing errors
    pub async fn search_entries(
        &self,
        query: &str,
        limit: u32,
        filter: AnimationFilter,
    ) -> SourceResult<Vec<CatalogEntry>> {
        let variables = search_variables(query, limit, filter);
        let data: SearchData = self.post_query(&self.search_url, SEARCH_QUERY, variables).await?;
        Ok(data
            .emotes
            .search
            .items
            .into_iter()
            .map(map_search_item)
            .collect())
    }

    /// Run the trending query and map the items, without swallowing errors
    pub async fn trending_entries(
        &self,
        period: TrendingPeriod,
        limit: u32,
        filter: AnimationFilter,
    ) -> SourceResult<Vec<CatalogEntry>> {
        let variables = trending_variables(period, limit, filter);
        let data: TrendingData = self
            .post_query(&self.trending_url, TRENDING_QUERY, variables)
            .await?;
        Ok(data
            .emotes
            .items
            .into_iter()
            .map(map_trending_item)
            .collect())
    }

    async fn post_query<T>(&self, url: &str, query: &str, variables: Value) -> SourceResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let payload = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: GraphQlResponse<T> = response.json().await.map_err(|e| SourceError::Parse {
            message: e.to_string(),
        })?;

        match body.data {
            Some(data) => {
                if !body.errors.is_empty() {
                    debug!(
                        "7TV returned data with {} partial errors: {}",
                        body.errors.len(),
                        join_errors(&body.errors)
                    );
                }
                Ok(data)
            }
            None if !body.errors.is_empty() => Err(SourceError::GraphQl {
                message: join_errors(&body.errors),
            }),
            None => Err(SourceError::Parse {
                message: "response contained neither data nor errors".to_string(),
            }),
        }
    }
}

#[async_trait]
impl CatalogSource for SevenTvClient {
    async fn search(&self, query: &str, limit: u32, filter: AnimationFilter) -> Vec<CatalogEntry> {
        let started = Instant::now();
        match self.search_entries(query, limit, filter).await {
            Ok(entries) => {
                let entries = retain_admitted(entries, filter);
                debug!(
                    query,
                    limit,
                    %filter,
                    count = entries.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "7TV search completed"
                );
                entries
            }
            Err(e) => {
                warn!(query, %filter, "7TV search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn trending(
        &self,
        period: TrendingPeriod,
        limit: u32,
        filter: AnimationFilter,
    ) -> Vec<CatalogEntry> {
        let started = Instant::now();
        match self.trending_entries(period, limit, filter).await {
            Ok(entries) => {
                let entries = retain_admitted(entries, filter);
                debug!(
                    %period,
                    limit,
                    %filter,
                    count = entries.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "7TV trending fetch completed"
                );
                entries
            }
            Err(e) => {
                warn!(%period, %filter, "7TV trending fetch failed: {}", e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "7tv"
    }
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn animated_filter_value(filter: AnimationFilter) -> Value {
    match filter.upstream_animated() {
        Some(animated) => json!({ "animated": animated }),
        None => Value::Null,
    }
}

fn search_variables(query: &str, limit: u32, filter: AnimationFilter) -> Value {
    json!({
        "query": query,
        "tags": [],
        "sortBy": "TOP_ALL_TIME",
        "filters": animated_filter_value(filter),
        "page": 1,
        "perPage": limit,
    })
}

fn trending_variables(period: TrendingPeriod, limit: u32, filter: AnimationFilter) -> Value {
    json!({
        "limit": limit,
        "filter": animated_filter_value(filter),
        "period": period.as_ref(),
    })
}

/// Drop entries whose variants contradict the requested filter
///
/// An entry is animated when any of its variants is.
fn retain_admitted(entries: Vec<CatalogEntry>, filter: AnimationFilter) -> Vec<CatalogEntry> {
    if filter == AnimationFilter::All {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| {
            let animated = entry.variants.iter().any(ImageVariant::is_animated);
            entry.variants.is_empty() || filter.admits(animated)
        })
        .collect()
}

fn map_search_item(item: SearchItem) -> CatalogEntry {
    let owner = item
        .owner
        .and_then(|o| o.main_connection)
        .and_then(|c| c.platform_display_name)
        .filter(|name| !name.is_empty());

    CatalogEntry {
        id: item.id,
        name: item.default_name,
        owner,
        variants: item
            .images
            .into_iter()
            .map(|image| {
                ImageVariant::new(
                    image.url,
                    MimeType::parse(&image.mime),
                    image.scale,
                    image.width,
                    image.frame_count,
                )
            })
            .collect(),
        ranking: item.ranking,
    }
}

fn map_trending_item(item: TrendingItem) -> CatalogEntry {
    let frame_count = if item.animated { 2 } else { 1 };
    let host = item.host.url.trim_end_matches('/');

    let variants = item
        .host
        .files
        .iter()
        .map(|file| {
            ImageVariant::new(
                format!("https:{host}/{}", file.name),
                MimeType::parse(&format!("image/{}", file.format.to_ascii_lowercase())),
                scale_from_file_name(&file.name),
                file.width,
                frame_count,
            )
        })
        .collect();

    CatalogEntry {
        id: item.id,
        name: item.name,
        owner: None,
        variants,
        ranking: None,
    }
}

/// Scale encoded in CDN file names such as `4x.webp`; 0 when absent
fn scale_from_file_name(name: &str) -> u32 {
    let stem = name.split('.').next().unwrap_or_default();
    stem.strip_suffix('x')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};

    fn trending_fixture() -> Value {
        json!({
            "data": {
                "emotes": {
                    "items": [
                        {
                            "id": "01F6MQ",
                            "name": "catJAM",
                            "animated": true,
                            "host": {
                                "url": "//cdn.7tv.app/emote/01F6MQ",
                                "files": [
                                    { "name": "1x.webp", "format": "WEBP", "width": 32, "height": 32 },
                                    { "name": "4x.gif", "format": "GIF", "width": 128, "height": 128 }
                                ]
                            }
                        },
                        {
                            "id": "01GB2",
                            "name": "Clap",
                            "animated": false,
                            "host": { "url": "//cdn.7tv.app/emote/01GB2", "files": [] }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_trending_files_become_variants() {
        let data: GraphQlResponse<TrendingData> = serde_json::from_value(trending_fixture()).unwrap();
        let entries: Vec<_> = data
            .data
            .unwrap()
            .emotes
            .items
            .into_iter()
            .map(map_trending_item)
            .collect();

        assert_eq!(entries.len(), 2);
        let cat = &entries[0];
        assert_eq!(cat.variants.len(), 2);
        assert_eq!(cat.variants[0].url, "https://cdn.7tv.app/emote/01F6MQ/1x.webp");
        assert_eq!(cat.variants[0].mime, MimeType::Webp);
        assert_eq!(cat.variants[0].scale, 1);
        assert_eq!(cat.variants[1].scale, 4);
        assert_eq!(cat.variants[1].mime, MimeType::Gif);
        assert!(cat.variants.iter().all(ImageVariant::is_animated));
        assert!(entries[1].variants.is_empty());
    }

    #[test]
    fn test_search_item_mapping() {
        let item: SearchItem = serde_json::from_value(json!({
            "id": "60ae958e229664e8667aea38",
            "defaultName": "Kappa",
            "owner": { "mainConnection": { "platformDisplayName": "someone" } },
            "images": [
                { "url": "https://cdn.7tv.app/emote/x/1x.png", "mime": "image/png", "size": 100, "scale": 1, "width": 28, "frameCount": 1 }
            ],
            "ranking": 12
        }))
        .unwrap();

        let entry = map_search_item(item);
        assert_eq!(entry.name, "Kappa");
        assert_eq!(entry.owner.as_deref(), Some("someone"));
        assert_eq!(entry.ranking, Some(12));
        assert_eq!(entry.variants[0].mime, MimeType::Png);
    }

    #[test]
    fn test_filter_translation() {
        assert_eq!(search_variables("k", 5, AnimationFilter::All)["filters"], Value::Null);
        assert_eq!(
            search_variables("k", 5, AnimationFilter::Static)["filters"],
            json!({ "animated": false })
        );
        let vars = trending_variables(TrendingPeriod::TrendingDaily, 300, AnimationFilter::Animated);
        assert_eq!(vars["period"], "trending_daily");
        assert_eq!(vars["filter"], json!({ "animated": true }));
    }

    #[test]
    fn test_scale_from_file_name() {
        assert_eq!(scale_from_file_name("4x.webp"), 4);
        assert_eq!(scale_from_file_name("2x.avif"), 2);
        assert_eq!(scale_from_file_name("original.png"), 0);
    }

    #[test]
    fn test_local_filter_enforcement() {
        let animated = CatalogEntry {
            id: "a".into(),
            name: "a".into(),
            owner: None,
            variants: vec![ImageVariant::new("u", MimeType::Gif, 1, 32, 8)],
            ranking: None,
        };
        let still = CatalogEntry {
            id: "b".into(),
            variants: vec![ImageVariant::new("u", MimeType::Png, 1, 32, 1)],
            ..animated.clone()
        };
        let kept = retain_admitted(vec![animated, still], AnimationFilter::Static);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    async fn spawn_upstream(body: Value) -> String {
        let app = Router::new().route("/gql", post(move || async move { Json(body) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/gql")
    }

    fn client_for(url: &str) -> SevenTvClient {
        SevenTvClient::new(&UpstreamConfig {
            search_url: url.to_string(),
            trending_url: url.to_string(),
            ..UpstreamConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_trending_against_local_upstream() {
        let url = spawn_upstream(trending_fixture()).await;
        let client = client_for(&url);

        let entries = client
            .trending(TrendingPeriod::TrendingWeekly, 300, AnimationFilter::All)
            .await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "catJAM");
    }

    #[tokio::test]
    async fn test_graphql_errors_become_empty_results() {
        let url = spawn_upstream(json!({ "data": null, "errors": [{ "message": "rate limited" }] })).await;
        let client = client_for(&url);

        let err = client
            .search_entries("Kappa", 10, AnimationFilter::All)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::GraphQl { .. }));
        assert!(client.search("Kappa", 10, AnimationFilter::All).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_empty() {
        let client = client_for("http://127.0.0.1:9/gql");
        assert!(client.search("Kappa", 10, AnimationFilter::All).await.is_empty());
    }
}
