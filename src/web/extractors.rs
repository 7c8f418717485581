//! Request extractors and parameter parsing
//!
//! Numeric query parameters are parsed leniently: anything that is not an
//! integer is treated as absent and the endpoint default applies. Enum
//! parameters are strict and rejected with 400.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use std::convert::Infallible;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{AnimationFilter, CacheClass, TrendingPeriod};
use crate::services::emote_search::{EmoteService, SearchQuery, TrendingQuery};

/// Request context information
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    pub real_ip: Option<String>,
    pub request_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let real_ip = header("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip"));

        Ok(RequestContext {
            user_agent: header("user-agent"),
            real_ip,
            request_id: header("x-request-id").unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }
}

/// Parse an optional integer, treating garbage as absent
pub fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Parse an optional boolean flag the way query strings spell them
pub fn lenient_bool(raw: Option<&str>) -> Option<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "t" | "yes" | "on") => Some(true),
        Some("0" | "false" | "f" | "no" | "off") => Some(false),
        _ => None,
    }
}

/// Body of `POST /api/search-emotes`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SearchRequestBody {
    /// Free-text emote name query
    #[serde(default)]
    pub query: String,
    /// Maximum number of results, default 100, capped at 200
    #[serde(default)]
    pub limit: Option<i64>,
    /// Alias of `limit`, used when `limit` is absent or zero
    #[serde(default, rename = "perPage")]
    pub per_page: Option<i64>,
    /// Legacy flag, superseded by `emote_type`
    #[serde(default)]
    pub animated_only: Option<bool>,
    /// One of `all`, `animated`, `static`
    #[serde(default)]
    pub emote_type: Option<String>,
}

impl SearchRequestBody {
    pub fn into_query(self) -> AppResult<SearchQuery> {
        let query = EmoteService::validate_query(&self.query)?;
        let filter = AnimationFilter::resolve(self.emote_type.as_deref(), self.animated_only)?;
        let limit = match self.limit {
            Some(limit) if limit != 0 => Some(limit),
            _ => self.per_page.filter(|per_page| *per_page > 0),
        };
        Ok(SearchQuery {
            query,
            limit,
            filter,
        })
    }
}

/// Query string of `GET /api/trending/emotes`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendingParams {
    /// `trending_daily`, `trending_weekly` (default) or `trending_monthly`
    pub period: Option<String>,
    /// Page size, default 20, capped at 100
    pub limit: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// One of `all`, `animated`, `static`
    pub emote_type: Option<String>,
    /// Legacy flag, superseded by `emote_type`
    pub animated_only: Option<String>,
}

impl TrendingParams {
    pub fn into_query(self) -> AppResult<TrendingQuery> {
        Ok(TrendingQuery {
            period: TrendingPeriod::resolve(self.period.as_deref())?,
            limit: lenient_int(self.limit.as_deref()),
            page: lenient_int(self.page.as_deref()),
            filter: AnimationFilter::resolve(
                self.emote_type.as_deref(),
                lenient_bool(self.animated_only.as_deref()),
            )?,
        })
    }
}

/// Query string of the storage listing endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoragePageParams {
    /// 1-based page number
    pub page: Option<String>,
    /// Page size, default 20, capped at 100
    pub limit: Option<String>,
}

impl StoragePageParams {
    pub fn page(&self) -> Option<i64> {
        lenient_int(self.page.as_deref())
    }

    pub fn limit(&self) -> Option<i64> {
        lenient_int(self.limit.as_deref())
    }
}

/// Query string of `POST /api/cache/clear`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CacheClearParams {
    /// `all` (default), `search` or `trending`
    pub cache_type: Option<String>,
}

impl CacheClearParams {
    pub fn class(&self) -> AppResult<CacheClass> {
        CacheClass::resolve(self.cache_type.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use rstest::rstest;

    #[rstest]
    #[case(Some("5"), Some(5))]
    #[case(Some(" 12 "), Some(12))]
    #[case(Some("-3"), Some(-3))]
    #[case(Some("abc"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn test_lenient_int(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
        assert_eq!(lenient_int(raw), expected);
    }

    #[rstest]
    #[case(Some("true"), Some(true))]
    #[case(Some("1"), Some(true))]
    #[case(Some("FALSE"), Some(false))]
    #[case(Some("maybe"), None)]
    #[case(None, None)]
    fn test_lenient_bool(#[case] raw: Option<&str>, #[case] expected: Option<bool>) {
        assert_eq!(lenient_bool(raw), expected);
    }

    #[test]
    fn test_search_body_prefers_limit_over_per_page() {
        let body: SearchRequestBody =
            serde_json::from_str(r#"{"query":" Kappa ","limit":10,"perPage":50}"#).unwrap();
        let query = body.into_query().unwrap();
        assert_eq!(query.query, "Kappa");
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.filter, AnimationFilter::All);
    }

    #[test]
    fn test_search_body_falls_back_to_per_page() {
        let body: SearchRequestBody =
            serde_json::from_str(r#"{"query":"Kappa","perPage":50,"animated_only":true}"#).unwrap();
        let query = body.into_query().unwrap();
        assert_eq!(query.limit, Some(50));
        assert_eq!(query.filter, AnimationFilter::Animated);
    }

    #[rstest]
    #[case(r#"{"query":"   "}"#)]
    #[case(r#"{}"#)]
    #[case(r#"{"query":"Kappa","emote_type":"gif"}"#)]
    fn test_search_body_rejections(#[case] raw: &str) {
        let body: SearchRequestBody = serde_json::from_str(raw).unwrap();
        assert!(body.into_query().is_err());
    }

    #[test]
    fn test_trending_params_defaults_and_garbage() {
        let params = TrendingParams {
            limit: Some("lots".into()),
            page: Some("2".into()),
            ..TrendingParams::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.period, TrendingPeriod::TrendingWeekly);
        assert_eq!(query.limit, None);
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_trending_params_emote_type_wins() {
        let params = TrendingParams {
            emote_type: Some("static".into()),
            animated_only: Some("true".into()),
            ..TrendingParams::default()
        };
        assert_eq!(params.into_query().unwrap().filter, AnimationFilter::Static);

        let params = TrendingParams {
            period: Some("yearly".into()),
            ..TrendingParams::default()
        };
        assert!(params.into_query().is_err());
    }

    #[tokio::test]
    async fn test_request_context_headers() {
        let (mut parts, _) = Request::builder()
            .header("user-agent", "curl/8")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap()
            .into_parts();

        let context = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(context.user_agent.as_deref(), Some("curl/8"));
        assert_eq!(context.real_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(context.request_id, "abc-123");
    }
}
