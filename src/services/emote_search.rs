//! Emote resolution pipeline
//!
//! Search and trending requests go through the response cache; on a miss the
//! catalog is queried, the relevant entries are archived and the assembled
//! result is cached. Storage listings bypass both the catalog and the cache
//! and read straight from the object store.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::pagination::{PageWindow, clamp_limit, clamp_page};
use super::response_cache::{ResponseCache, keys};
use crate::config::LimitsConfig;
use crate::emote_assets::{EmoteArchiver, naming};
use crate::errors::{AppError, AppResult};
use crate::models::{AnimationFilter, SearchResult, StorageFolder, TrendingPeriod};
use crate::sources::CatalogSource;

pub const NO_SEARCH_RESULTS: &str = "No emotes found for the given query";
pub const STORAGE_UNAVAILABLE: &str = "Object storage is not properly configured or unavailable";

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: Option<i64>,
    pub filter: AnimationFilter,
}

/// Validated trending parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingQuery {
    pub period: TrendingPeriod,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub filter: AnimationFilter,
}

/// Outcome of a storage listing
#[derive(Debug)]
pub enum StorageListing {
    /// A result to serve with HTTP 200, including the "not configured" case
    Listed(SearchResult),
    /// The store failed; the message is user facing
    Failed(SearchResult),
}

#[derive(Clone)]
pub struct EmoteService {
    catalog: Arc<dyn CatalogSource>,
    archiver: EmoteArchiver,
    cache: ResponseCache,
    limits: LimitsConfig,
}

impl EmoteService {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        archiver: EmoteArchiver,
        cache: ResponseCache,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            catalog,
            archiver,
            cache,
            limits,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn archiver(&self) -> &EmoteArchiver {
        &self.archiver
    }

    pub fn catalog_name(&self) -> &str {
        self.catalog.name()
    }

    /// Search the catalog and archive every hit into `emote_api/`
    ///
    /// `totalFound` is the number of catalog matches, which can exceed the
    /// number of archived emotes when some fail to archive.
    pub async fn search(&self, query: SearchQuery, cancel: CancellationToken) -> SearchResult {
        let started = Instant::now();
        let limit = clamp_limit(query.limit, self.limits.search_default, self.limits.search_max);
        let text = query.query.trim().to_string();
        let key = keys::search_key(&text, limit, query.filter);

        self.cache
            .get_or_compute(&key, self.cache.search_ttl(), started, || async {
                let entries = self.catalog.search(&text, limit, query.filter).await;
                if entries.is_empty() {
                    return SearchResult::empty(NO_SEARCH_RESULTS);
                }

                let total_found = entries.len();
                let emotes = self
                    .archiver
                    .archive_batch(entries, StorageFolder::EmoteApi, cancel)
                    .await;
                info!(
                    query = %text,
                    total_found,
                    archived = emotes.len(),
                    "Search resolved"
                );
                SearchResult::found(total_found, emotes)
            })
            .await
    }

    /// Fetch the trending window, paginate it and archive the requested page
    /// into `trending_emotes/`
    pub async fn trending(&self, query: TrendingQuery, cancel: CancellationToken) -> SearchResult {
        let started = Instant::now();
        let limit = clamp_limit(query.limit, self.limits.trending_default, self.limits.trending_max);
        let page = clamp_page(query.page);
        let key = keys::trending_key(query.period, limit, page, query.filter);

        self.cache
            .get_or_compute(&key, self.cache.trending_ttl(), started, || async {
                let entries = self
                    .catalog
                    .trending(query.period, self.limits.trending_fetch, query.filter)
                    .await;

                let window = PageWindow::new(entries.len(), page, limit);
                let empty_message = format!("No trending emotes found for period: {}", query.period);
                if let Some(result) = window.short_circuit(&empty_message) {
                    return result;
                }

                let page_entries = window.slice(&entries).to_vec();
                let emotes = self
                    .archiver
                    .archive_batch(page_entries, StorageFolder::TrendingEmotes, cancel)
                    .await;
                debug!(
                    period = %query.period,
                    page,
                    total = entries.len(),
                    archived = emotes.len(),
                    "Trending page resolved"
                );
                window.stamp(SearchResult::found(entries.len(), emotes))
            })
            .await
    }

    /// Page through what has already been archived in `folder`
    pub async fn list_storage(
        &self,
        folder: StorageFolder,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> StorageListing {
        let started = Instant::now();
        let limit = clamp_limit(limit, self.limits.storage_default, self.limits.storage_max);
        let page = clamp_page(page);

        let Some(storage) = self.archiver.storage() else {
            let window = PageWindow::new(0, page, limit);
            return StorageListing::Listed(
                window
                    .stamp(SearchResult::failure(STORAGE_UNAVAILABLE))
                    .timed(started),
            );
        };

        let keys = match storage.list(&folder.prefix()).await {
            Ok(keys) => keys,
            Err(e) => {
                return StorageListing::Failed(
                    SearchResult::failure(format!("Error accessing object storage: {e}")).timed(started),
                );
            }
        };

        let window = PageWindow::new(keys.len(), page, limit);
        let empty_message = match folder {
            StorageFolder::EmoteApi => "No emotes found in storage",
            StorageFolder::TrendingEmotes => "No trending emotes found in storage",
        };
        if let Some(result) = window.short_circuit(empty_message) {
            return StorageListing::Listed(result.timed(started));
        }

        let emotes = window
            .slice(&keys)
            .iter()
            .filter_map(|key| naming::record_from_key(folder, key, storage.public_url(key)))
            .collect();

        StorageListing::Listed(
            window
                .stamp(SearchResult::found(keys.len(), emotes))
                .timed(started),
        )
    }

    /// Validate and normalize a free-text query
    pub fn validate_query(raw: &str) -> AppResult<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Query parameter is required"));
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emote_assets::{AssetFetcher, BlobStore, ObjectBlobStore};
    use crate::errors::FetchError;
    use crate::models::{CatalogEntry, ImageVariant, MimeType};
    use crate::services::response_cache::MemoryCacheStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedCatalog {
        entries: Vec<CatalogEntry>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn search(&self, _query: &str, limit: u32, _filter: AnimationFilter) -> Vec<CatalogEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entries.iter().take(limit as usize).cloned().collect()
        }

        async fn trending(&self, _period: TrendingPeriod, limit: u32, _filter: AnimationFilter) -> Vec<CatalogEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entries.iter().take(limit as usize).cloned().collect()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct OkFetcher;

    #[async_trait]
    impl AssetFetcher for OkFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            if url.contains("broken") {
                return Err(FetchError::Status {
                    status: 500,
                    url: url.to_string(),
                });
            }
            Ok(Bytes::from_static(b"img"))
        }
    }

    fn entries(n: usize) -> Vec<CatalogEntry> {
        (0..n)
            .map(|i| CatalogEntry {
                id: format!("e{i:03}"),
                name: format!("Emote{i}"),
                owner: None,
                variants: vec![ImageVariant::new(
                    format!("https://cdn/e{i}/4x.webp"),
                    MimeType::Webp,
                    4,
                    128,
                    1,
                )],
                ranking: None,
            })
            .collect()
    }

    fn service(catalog: Vec<CatalogEntry>, storage: Option<Arc<dyn BlobStore>>) -> (EmoteService, Arc<FixedCatalog>) {
        let catalog = Arc::new(FixedCatalog {
            entries: catalog,
            calls: AtomicUsize::new(0),
        });
        let archiver = EmoteArchiver::new(storage, Arc::new(OkFetcher), 10);
        let cache = ResponseCache::new(
            Arc::new(MemoryCacheStore::new()),
            Duration::from_secs(3600),
            Duration::from_secs(900),
        );
        (
            EmoteService::new(catalog.clone(), archiver, cache, LimitsConfig::default()),
            catalog,
        )
    }

    fn memory_storage() -> Option<Arc<dyn BlobStore>> {
        Some(Arc::new(ObjectBlobStore::in_memory("https://cdn.test")))
    }

    #[tokio::test]
    async fn test_total_found_counts_catalog_matches_not_archived_emotes() {
        let mut catalog = entries(3);
        catalog[1].variants[0].url = "https://cdn/broken/4x.webp".to_string();
        let (service, _) = service(catalog, memory_storage());

        let result = service
            .search(
                SearchQuery {
                    query: "Kappa".to_string(),
                    limit: Some(10),
                    filter: AnimationFilter::All,
                },
                CancellationToken::new(),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.total_found, 3);
        assert_eq!(result.emotes.len(), 2);
        assert!(result.page.is_none());
    }

    #[tokio::test]
    async fn test_search_is_cached() {
        let (service, catalog) = service(entries(2), memory_storage());
        let query = SearchQuery {
            query: " Kappa ".to_string(),
            limit: None,
            filter: AnimationFilter::All,
        };

        let first = service.search(query.clone(), CancellationToken::new()).await;
        let second = service.search(query, CancellationToken::new()).await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_search_is_successful() {
        let (service, _) = service(Vec::new(), memory_storage());
        let result = service
            .search(
                SearchQuery {
                    query: "nothing".to_string(),
                    limit: None,
                    filter: AnimationFilter::All,
                },
                CancellationToken::new(),
            )
            .await;
        assert!(result.success);
        assert_eq!(result.total_found, 0);
        assert_eq!(result.message.as_deref(), Some(NO_SEARCH_RESULTS));
    }

    #[tokio::test]
    async fn test_trending_second_page() {
        let (service, _) = service(entries(45), memory_storage());
        let result = service
            .trending(
                TrendingQuery {
                    period: TrendingPeriod::TrendingWeekly,
                    limit: Some(20),
                    page: Some(2),
                    filter: AnimationFilter::All,
                },
                CancellationToken::new(),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.total_found, 45);
        assert_eq!(result.total_pages, Some(3));
        assert_eq!(result.has_next_page, Some(true));
        let mut ids: Vec<_> = result.emotes.iter().map(|e| e.emote_id.clone()).collect();
        ids.sort();
        let expected: Vec<_> = (20..40).map(|i| format!("e{i:03}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_trending_without_results() {
        let (service, _) = service(Vec::new(), memory_storage());
        let result = service
            .trending(
                TrendingQuery {
                    period: TrendingPeriod::TrendingDaily,
                    limit: None,
                    page: None,
                    filter: AnimationFilter::All,
                },
                CancellationToken::new(),
            )
            .await;
        assert!(result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("No trending emotes found for period: trending_daily")
        );
        assert_eq!(result.total_pages, Some(0));
    }

    #[tokio::test]
    async fn test_storage_page_past_the_end() {
        let storage: Arc<dyn BlobStore> = Arc::new(ObjectBlobStore::in_memory("https://cdn.test"));
        for i in 0..40 {
            storage
                .upload(
                    &format!("trending_emotes/e{i:03}_static.webp"),
                    Bytes::from_static(b"x"),
                    "image/webp",
                )
                .await
                .unwrap();
        }
        let (service, _) = service(Vec::new(), Some(storage));

        let StorageListing::Listed(result) = service
            .list_storage(StorageFolder::TrendingEmotes, Some(5), Some(20))
            .await
        else {
            panic!("listing should not fail");
        };
        assert!(!result.success);
        assert!(result.emotes.is_empty());
        assert_eq!(
            result.message.as_deref(),
            Some("Page 5 exceeds available pages (total: 2)")
        );

        let StorageListing::Listed(result) = service
            .list_storage(StorageFolder::TrendingEmotes, Some(2), Some(20))
            .await
        else {
            panic!("listing should not fail");
        };
        assert!(result.success);
        assert_eq!(result.emotes.len(), 20);
        assert_eq!(result.emotes[0].emote_id, "e020");
        assert_eq!(result.has_next_page, Some(false));
    }

    #[tokio::test]
    async fn test_storage_not_configured() {
        let (service, _) = service(Vec::new(), None);
        let StorageListing::Listed(result) = service.list_storage(StorageFolder::EmoteApi, None, None).await else {
            panic!("unconfigured storage is not a failure");
        };
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some(STORAGE_UNAVAILABLE));
        assert_eq!(result.results_per_page, Some(20));
    }

    #[test]
    fn test_validate_query() {
        assert_eq!(EmoteService::validate_query("  Kappa ").unwrap(), "Kappa");
        assert!(EmoteService::validate_query("   ").is_err());
    }
}
