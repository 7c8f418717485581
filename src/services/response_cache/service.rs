use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::keys::{self, SEARCH_NAMESPACE, TRENDING_NAMESPACE};
use super::store::CacheStore;
use crate::errors::CacheResult;
use crate::models::{CacheClass, SearchResult};

/// Cache-aside wrapper around a [`CacheStore`]
///
/// Store failures never reach the caller: reads degrade to misses and writes
/// are logged and forgotten. There is no per-key locking, so concurrent misses
/// on one key may both compute and the last write wins.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    search_ttl: Duration,
    trending_ttl: Duration,
}

/// Result of an administrative clear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearReport {
    #[serde(rename = "type")]
    pub class: CacheClass,
    /// Removed key count per namespace
    pub removed: BTreeMap<String, u64>,
    pub total_removed: u64,
}

/// Snapshot served by the cache status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    /// `connected` or `error`
    pub status: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_keys: u64,
    pub emote_search_keys: u64,
    pub trending_keys: u64,
    pub used_memory: String,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups that hit, 0 when there were none
    pub hit_ratio: f64,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, search_ttl: Duration, trending_ttl: Duration) -> Self {
        Self {
            store,
            search_ttl,
            trending_ttl,
        }
    }

    pub fn search_ttl(&self) -> Duration {
        self.search_ttl
    }

    pub fn trending_ttl(&self) -> Duration {
        self.trending_ttl
    }

    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// Serve `key` from the store or compute, store and return it
    ///
    /// Whatever the source, the returned result carries `cached` and
    /// `processing_time` for the current request measured from `started`.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        started: Instant,
        compute: F,
    ) -> SearchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SearchResult>,
    {
        if let Some(mut hit) = self.lookup(key).await {
            hit.cached = true;
            hit.processing_time = started.elapsed().as_secs_f64();
            debug!(key, "Cache hit");
            return hit;
        }

        let mut result = compute().await;
        result.cached = false;
        result.processing_time = started.elapsed().as_secs_f64();

        match serde_json::to_vec(&result) {
            Ok(bytes) => {
                if let Err(e) = self.store.set(key, bytes, ttl).await {
                    warn!(key, "Failed to store cache entry: {}", e);
                }
            }
            Err(e) => warn!(key, "Failed to serialize cache entry: {}", e),
        }
        result
    }

    async fn lookup(&self, key: &str) -> Option<SearchResult> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "Cache read failed, treating as miss: {}", e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(key, "Undecodable cache entry, treating as miss: {}", e);
                None
            }
        }
    }

    /// Remove every key of the namespaces `class` covers
    pub async fn clear(&self, class: CacheClass) -> CacheResult<CacheClearReport> {
        let mut removed = BTreeMap::new();
        for namespace in keys::namespaces(class) {
            let matched = self
                .store
                .keys_matching(&keys::namespace_prefix(namespace))
                .await?;
            let count = if matched.is_empty() {
                0
            } else {
                self.store.delete(&matched).await?
            };
            removed.insert(namespace.to_string(), count);
        }

        let total_removed: u64 = removed.values().sum();
        debug!(%class, total_removed, "Cache cleared");
        Ok(CacheClearReport {
            class,
            removed,
            total_removed,
        })
    }

    /// Collect the status snapshot; a store failure is reported in-band
    pub async fn status(&self) -> CacheStatus {
        match self.try_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Cache status unavailable: {}", e);
                CacheStatus {
                    status: "error".to_string(),
                    backend: self.store.backend_name().to_string(),
                    message: Some(e.to_string()),
                    total_keys: 0,
                    emote_search_keys: 0,
                    trending_keys: 0,
                    used_memory: "unknown".to_string(),
                    hits: 0,
                    misses: 0,
                    hit_ratio: 0.0,
                }
            }
        }
    }

    async fn try_status(&self) -> CacheResult<CacheStatus> {
        self.store.ping().await?;
        let stats = self.store.stats().await?;
        let search_keys = self
            .store
            .keys_matching(&keys::namespace_prefix(SEARCH_NAMESPACE))
            .await?;
        let trending_keys = self
            .store
            .keys_matching(&keys::namespace_prefix(TRENDING_NAMESPACE))
            .await?;

        let lookups = stats.hits + stats.misses;
        let hit_ratio = if lookups > 0 {
            stats.hits as f64 / lookups as f64 * 100.0
        } else {
            0.0
        };

        Ok(CacheStatus {
            status: "connected".to_string(),
            backend: self.store.backend_name().to_string(),
            message: None,
            total_keys: stats.total_keys,
            emote_search_keys: search_keys.len() as u64,
            trending_keys: trending_keys.len() as u64,
            used_memory: stats.used_memory.unwrap_or_else(|| "unknown".to_string()),
            hits: stats.hits,
            misses: stats.misses,
            hit_ratio,
        })
    }

    /// Connectivity check used by the health endpoint
    pub async fn is_reachable(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}
