use async_trait::async_trait;
use std::time::Duration;

use crate::errors::CacheResult;

/// Snapshot of a cache backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total_keys: u64,
    /// Human readable memory usage, when the backend reports it
    pub used_memory: Option<String>,
    pub hits: u64,
    pub misses: u64,
}

/// Byte-oriented key-value store with per-key expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// All live keys starting with `prefix`
    async fn keys_matching(&self, prefix: &str) -> CacheResult<Vec<String>>;

    /// Delete `keys`, returning how many existed
    async fn delete(&self, keys: &[String]) -> CacheResult<u64>;

    async fn stats(&self) -> CacheResult<StoreStats>;

    async fn ping(&self) -> CacheResult<()>;

    fn backend_name(&self) -> &str;
}
