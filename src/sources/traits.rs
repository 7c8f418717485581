//! Catalog source abstraction
//!
//! Request handlers only ever see a `dyn CatalogSource`; the production
//! implementation talks to 7TV and tests substitute canned catalogs.

use async_trait::async_trait;

use crate::models::{AnimationFilter, CatalogEntry, TrendingPeriod};

/// Read access to a remote emote catalog
///
/// Implementations never fail: upstream errors are logged and surface as an
/// empty list, which callers report as "nothing found".
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Full-text search, upstream order preserved
    async fn search(&self, query: &str, limit: u32, filter: AnimationFilter) -> Vec<CatalogEntry>;

    /// Ranked listing for a trending window
    async fn trending(
        &self,
        period: TrendingPeriod,
        limit: u32,
        filter: AnimationFilter,
    ) -> Vec<CatalogEntry>;

    /// Short name used in logs and health output
    fn name(&self) -> &str;
}
