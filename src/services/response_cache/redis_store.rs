//! Redis-backed cache store
//!
//! Uses a multiplexed [`ConnectionManager`] that reconnects on its own; each
//! operation works on a cheap clone of it. Key enumeration uses `SCAN` so a
//! clear never blocks the server the way `KEYS` would.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, info};

use super::store::{CacheStore, StoreStats};
use crate::errors::CacheResult;
use crate::utils::url::UrlUtils;

const SCAN_BATCH: usize = 500;
const DELETE_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(
            "Connected to Redis at {}",
            UrlUtils::obfuscate_credentials(url)
        );
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn keys_matching(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn.clone();
        let mut removed = 0;
        for chunk in keys.chunks(DELETE_BATCH) {
            let n: u64 = redis::cmd("DEL").arg(chunk).query_async(&mut conn).await?;
            removed += n;
        }
        debug!("Deleted {} of {} requested keys", removed, keys.len());
        Ok(removed)
    }

    async fn stats(&self) -> CacheResult<StoreStats> {
        let mut conn = self.conn.clone();
        let info: String = redis::cmd("INFO").query_async(&mut conn).await?;
        let total_keys: u64 = redis::cmd("DBSIZE").query_async(&mut conn).await?;

        let mut stats = parse_info(&info);
        stats.total_keys = total_keys;
        Ok(stats)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "redis"
    }
}

/// Pull memory and keyspace counters out of an `INFO` reply
fn parse_info(info: &str) -> StoreStats {
    let mut stats = StoreStats::default();
    for line in info.lines() {
        let Some((field, value)) = line.trim().split_once(':') else {
            continue;
        };
        match field {
            "used_memory_human" => stats.used_memory = Some(value.to_string()),
            "keyspace_hits" => stats.hits = value.parse().unwrap_or(0),
            "keyspace_misses" => stats.misses = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    stats
}
