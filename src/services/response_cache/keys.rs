//! Cache key construction
//!
//! Every variable component is separated by `:`. The free-text search query is
//! always the last component so a colon inside it can never shift the other
//! fields.

use crate::models::{AnimationFilter, CacheClass, TrendingPeriod};

pub const SEARCH_NAMESPACE: &str = "emote_search";
pub const TRENDING_NAMESPACE: &str = "trending";

pub fn search_key(query: &str, limit: u32, filter: AnimationFilter) -> String {
    format!("{SEARCH_NAMESPACE}:{filter}:{limit}:{}", query.trim())
}

pub fn trending_key(period: TrendingPeriod, limit: u32, page: u32, filter: AnimationFilter) -> String {
    format!("{TRENDING_NAMESPACE}:{period}:{limit}:{page}:{filter}")
}

/// Namespaces covered by a clear request
pub fn namespaces(class: CacheClass) -> &'static [&'static str] {
    match class {
        CacheClass::All => &[SEARCH_NAMESPACE, TRENDING_NAMESPACE],
        CacheClass::Search => &[SEARCH_NAMESPACE],
        CacheClass::Trending => &[TRENDING_NAMESPACE],
    }
}

/// Prefix shared by every key of a namespace
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}:")
}
