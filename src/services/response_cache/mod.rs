//! Cache-aside layer for serialized emote listings
//!
//! Keys live in two namespaces, one per endpoint family. Values are the JSON
//! encoding of a [`SearchResult`](crate::models::SearchResult) and expire by
//! TTL; nothing invalidates them early except the administrative clear.

pub mod keys;
pub mod memory_store;
pub mod redis_store;
pub mod service;
pub mod store;

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use service::{CacheClearReport, CacheStatus, ResponseCache};
pub use store::{CacheStore, StoreStats};
