/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Upstream catalog defaults
pub const DEFAULT_SEVENTV_GQL_URL: &str = "https://api.7tv.app/v4/gql";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = concat!("emote-proxy/", env!("CARGO_PKG_VERSION"));

// Cache defaults
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_REDIS_DB: i64 = 0;
pub const DEFAULT_SEARCH_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_TRENDING_CACHE_TTL_SECS: u64 = 900;
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 3600;

// Storage defaults
pub const DEFAULT_CONTAINER_NAME: &str = "emotes";
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data/emotes";

// Archival defaults
pub const DEFAULT_ARCHIVE_CONCURRENCY: usize = 10;
pub const DEFAULT_ASSET_FETCH_TIMEOUT_SECS: u64 = 20;

// Request limits
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;
pub const MAX_SEARCH_LIMIT: u32 = 200;
pub const DEFAULT_TRENDING_LIMIT: u32 = 20;
pub const MAX_TRENDING_LIMIT: u32 = 100;
pub const DEFAULT_TRENDING_FETCH_LIMIT: u32 = 300;
pub const DEFAULT_STORAGE_PAGE_LIMIT: u32 = 20;
pub const MAX_STORAGE_PAGE_LIMIT: u32 = 100;
