//! In-process cache store for development, tests and the Redis-down fallback

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

use super::store::{CacheStore, StoreStats};
use crate::errors::CacheResult;
use crate::utils::format_memory;

/// Writes between full sweeps of expired entries
const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// TTL map behind a read-write lock
///
/// An expired entry is dropped when a read finds it, and every
/// `SWEEP_INTERVAL` writes the whole map is swept, so keys that are never
/// read again do not accumulate.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    writes: Arc<AtomicU64>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| value.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            trace!("Purged {} expired cache entries", purged);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let (found, expired) = match self.entries.read().await.get(key) {
            Some(value) if value.is_live(now) => (Some(value.bytes.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };

        if expired {
            let mut entries = self.entries.write().await;
            // A concurrent set may have refreshed the key since the read
            if entries.get(key).is_some_and(|value| !value.is_live(now)) {
                entries.remove(key);
            }
        }

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let stored = StoredValue {
            bytes: value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().await.insert(key.to_string(), stored);

        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % SWEEP_INTERVAL == 0 {
            self.purge_expired().await;
        }
        Ok(())
    }

    async fn keys_matching(&self, prefix: &str) -> CacheResult<Vec<String>> {
        self.purge_expired().await;
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = keys.iter().filter(|key| entries.remove(*key).is_some()).count();
        Ok(removed as u64)
    }

    async fn stats(&self) -> CacheResult<StoreStats> {
        self.purge_expired().await;
        let entries = self.entries.read().await;
        let bytes: usize = entries
            .iter()
            .map(|(key, value)| key.len() + value.bytes.len())
            .sum();

        Ok(StoreStats {
            total_keys: entries.len() as u64,
            used_memory: Some(format_memory(bytes as f64)),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_and_expiry() {
        let store = MemoryCacheStore::new();
        store.set("k", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        store.set("gone", b"v".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(store.get("missing").await.unwrap(), None);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_keys, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_expired_entries_do_not_accumulate() {
        let store = MemoryCacheStore::new();
        for i in 0..10_000 {
            let key = format!("emote_search:all:20:query{i}");
            store.set(&key, b"[]".to_vec(), Duration::ZERO).await.unwrap();
            assert_eq!(store.get(&key).await.unwrap(), None);
        }
        assert_eq!(store.entries.read().await.len(), 0);

        // Written but never read again: the periodic sweep collects them
        for i in 0..(SWEEP_INTERVAL * 2) {
            let key = format!("trending:weekly:{i}");
            store.set(&key, Vec::new(), Duration::ZERO).await.unwrap();
        }
        assert!(store.entries.read().await.len() < SWEEP_INTERVAL as usize);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let store = MemoryCacheStore::new();
        store
            .set("k", b"v".to_vec(), Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.stats().await.unwrap().total_keys, 1);
    }

    #[tokio::test]
    async fn test_prefix_listing_and_delete() {
        let store = MemoryCacheStore::new();
        for key in ["emote_search:all:1:a", "emote_search:all:1:b", "trending:x"] {
            store.set(key, Vec::new(), Duration::from_secs(60)).await.unwrap();
        }

        let keys = store.keys_matching("emote_search:").await.unwrap();
        assert_eq!(keys, vec!["emote_search:all:1:a", "emote_search:all:1:b"]);

        let removed = store
            .delete(&[keys[0].clone(), "not-there".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.keys_matching("").await.unwrap().len(), 2);
    }
}
