use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

use crate::utils::url::UrlUtils;

/// Prefix for structured environment overrides, e.g. `EMOTE_PROXY_CACHE__BACKEND=memory`
pub const ENV_PREFIX: &str = "EMOTE_PROXY_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub archive: ArchiveConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Overall per-request timeout; the only cancellation signal for in-flight work
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// GraphQL endpoint used for emote search
    #[serde(default = "default_gql_url")]
    pub search_url: String,
    /// GraphQL endpoint used for trending listings
    #[serde(default = "default_gql_url")]
    pub trending_url: String,
    #[serde(default = "default_upstream_timeout", with = "duration")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,
    /// Full Redis URL; takes precedence over the host/port/db fields
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_redis_host")]
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default = "default_redis_db")]
    pub redis_db: i64,
    #[serde(default)]
    pub redis_password: Option<String>,
    #[serde(default = "default_search_ttl", with = "duration")]
    pub search_ttl: Duration,
    #[serde(default = "default_trending_ttl", with = "duration")]
    pub trending_ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Azure,
    Local,
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default)]
    pub azure_connection_string: Option<String>,
    #[serde(default = "default_container_name")]
    pub container_name: String,
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    /// Base URL objects are publicly reachable under; derived from the backend when unset
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Maximum number of archival workers in flight per batch
    #[serde(default = "default_archive_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_fetch_timeout", with = "duration")]
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_search_limit")]
    pub search_default: u32,
    #[serde(default = "max_search_limit")]
    pub search_max: u32,
    #[serde(default = "default_trending_limit")]
    pub trending_default: u32,
    #[serde(default = "max_trending_limit")]
    pub trending_max: u32,
    /// Number of upstream trending entries fetched and paginated over
    #[serde(default = "default_trending_fetch_limit")]
    pub trending_fetch: u32,
    #[serde(default = "default_storage_page_limit")]
    pub storage_default: u32,
    #[serde(default = "max_storage_page_limit")]
    pub storage_max: u32,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

// Upstream defaults
fn default_gql_url() -> String {
    DEFAULT_SEVENTV_GQL_URL.to_string()
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Cache defaults
fn default_cache_backend() -> CacheBackend {
    CacheBackend::Redis
}

fn default_redis_host() -> String {
    DEFAULT_REDIS_HOST.to_string()
}

fn default_redis_port() -> u16 {
    DEFAULT_REDIS_PORT
}

fn default_redis_db() -> i64 {
    DEFAULT_REDIS_DB
}

fn default_search_ttl() -> Duration {
    Duration::from_secs(DEFAULT_SEARCH_CACHE_TTL_SECS)
}

fn default_trending_ttl() -> Duration {
    Duration::from_secs(DEFAULT_TRENDING_CACHE_TTL_SECS)
}

// Storage defaults
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Azure
}

fn default_container_name() -> String {
    DEFAULT_CONTAINER_NAME.to_string()
}

fn default_local_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH)
}

// Archive defaults
fn default_archive_concurrency() -> usize {
    DEFAULT_ARCHIVE_CONCURRENCY
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_ASSET_FETCH_TIMEOUT_SECS)
}

// Limit defaults
fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

fn max_search_limit() -> u32 {
    MAX_SEARCH_LIMIT
}

fn default_trending_limit() -> u32 {
    DEFAULT_TRENDING_LIMIT
}

fn max_trending_limit() -> u32 {
    MAX_TRENDING_LIMIT
}

fn default_trending_fetch_limit() -> u32 {
    DEFAULT_TRENDING_FETCH_LIMIT
}

fn default_storage_page_limit() -> u32 {
    DEFAULT_STORAGE_PAGE_LIMIT
}

fn max_storage_page_limit() -> u32 {
    MAX_STORAGE_PAGE_LIMIT
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            search_url: default_gql_url(),
            trending_url: default_gql_url(),
            timeout: default_upstream_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: None,
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: default_redis_db(),
            redis_password: None,
            search_ttl: default_search_ttl(),
            trending_ttl: default_trending_ttl(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            azure_connection_string: None,
            container_name: default_container_name(),
            local_path: default_local_path(),
            public_base_url: None,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            concurrency: default_archive_concurrency(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            search_default: default_search_limit(),
            search_max: max_search_limit(),
            trending_default: default_trending_limit(),
            trending_max: max_trending_limit(),
            trending_fetch: default_trending_fetch_limit(),
            storage_default: default_storage_page_limit(),
            storage_max: max_storage_page_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            storage: StorageConfig::default(),
            archive: ArchiveConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Redis connection URL, built from the discrete fields when no URL is set
    pub fn redis_connection_url(&self) -> String {
        if let Some(url) = self.redis_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        let base = format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        );
        let Some(password) = self.redis_password.as_deref().filter(|p| !p.is_empty()) else {
            return base;
        };

        if let Ok(mut url) = url::Url::parse(&base) {
            if url.set_password(Some(password)).is_ok() {
                return url.to_string();
            }
        }
        warn!("Cannot attach the Redis password to '{}', connecting without it", base);
        base
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment
    ///
    /// Precedence (lowest to highest): built-in defaults, the TOML file, the
    /// plain variables of the original deployment (`REDIS_URL`, `CACHE_TTL`, ...)
    /// and finally `EMOTE_PROXY_*` variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration file: {}", path.display());
            } else {
                info!("Configuration file {} not found, using defaults", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let mut config: Config = figment
            .extract()
            .context("Failed to parse configuration file")?;
        config.apply_plain_env(|name| std::env::var(name).ok())?;

        let config: Config = Figment::from(Serialized::defaults(config))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to apply EMOTE_PROXY_* environment overrides")?;

        config.validate()?;
        Ok(config)
    }

    /// Apply the unprefixed environment variables the service has always honoured
    pub fn apply_plain_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("REDIS_URL") {
            self.cache.redis_url = Some(url);
        }
        if let Some(host) = get("REDIS_HOST") {
            self.cache.redis_host = host;
        }
        if let Some(port) = get("REDIS_PORT") {
            self.cache.redis_port = port
                .parse()
                .with_context(|| format!("Invalid REDIS_PORT '{port}'"))?;
        }
        if let Some(db) = get("REDIS_DB") {
            self.cache.redis_db = db
                .parse()
                .with_context(|| format!("Invalid REDIS_DB '{db}'"))?;
        }
        if let Some(password) = get("REDIS_PASSWORD") {
            self.cache.redis_password = Some(password);
        }
        if let Some(ttl) = get("CACHE_TTL") {
            self.cache.search_ttl = parse_seconds("CACHE_TTL", &ttl)?;
        }
        if let Some(ttl) = get("TRENDING_CACHE_TTL") {
            self.cache.trending_ttl = parse_seconds("TRENDING_CACHE_TTL", &ttl)?;
        }
        if let Some(conn) = get("AZURE_CONNECTION_STRING") {
            self.storage.azure_connection_string = Some(conn);
        }
        if let Some(container) = get("CONTAINER_NAME") {
            self.storage.container_name = container;
        }
        if let Some(port) = get("PORT") {
            self.web.port = port
                .parse()
                .with_context(|| format!("Invalid PORT '{port}'"))?;
        }
        Ok(())
    }

    /// Reject configurations that would make request handling meaningless
    pub fn validate(&self) -> Result<()> {
        if self.archive.concurrency == 0 {
            bail!("archive.concurrency must be at least 1");
        }
        let limits = &self.limits;
        for (name, default, max) in [
            ("search", limits.search_default, limits.search_max),
            ("trending", limits.trending_default, limits.trending_max),
            ("storage", limits.storage_default, limits.storage_max),
        ] {
            if default == 0 || max == 0 {
                bail!("limits.{name}_default and limits.{name}_max must be at least 1");
            }
            if default > max {
                bail!("limits.{name}_default ({default}) exceeds limits.{name}_max ({max})");
            }
        }
        if limits.trending_fetch == 0 {
            bail!("limits.trending_fetch must be at least 1");
        }
        let max_ttl = Duration::from_secs(MAX_CACHE_TTL_SECS);
        for (name, ttl) in [
            ("cache.search_ttl", self.cache.search_ttl),
            ("cache.trending_ttl", self.cache.trending_ttl),
        ] {
            if ttl.is_zero() || ttl > max_ttl {
                bail!(
                    "{name} must be between 1s and {}, got {}s",
                    humantime::format_duration(max_ttl),
                    ttl.as_secs()
                );
            }
        }
        for (name, url) in [
            ("upstream.search_url", &self.upstream.search_url),
            ("upstream.trending_url", &self.upstream.trending_url),
        ] {
            UrlUtils::parse_and_validate(url)
                .with_context(|| format!("{name} is not a valid URL: '{url}'"))?;
        }
        Ok(())
    }

    /// Copy of the configuration with secrets masked, safe to print
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if let Some(url) = &redacted.cache.redis_url {
            redacted.cache.redis_url = Some(UrlUtils::obfuscate_credentials(url));
        }
        if redacted.cache.redis_password.is_some() {
            redacted.cache.redis_password = Some("****".to_string());
        }
        if let Some(conn) = &redacted.storage.azure_connection_string {
            redacted.storage.azure_connection_string =
                Some(UrlUtils::obfuscate_connection_string(conn));
        }
        redacted
    }

    /// Render the redacted configuration as TOML
    pub fn to_redacted_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }

    /// Log the effective configuration with sensitive data masked
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        match self.cache.backend {
            CacheBackend::Redis => info!(
                "  Cache: redis at {}",
                UrlUtils::obfuscate_credentials(&self.cache.redis_connection_url())
            ),
            CacheBackend::Memory => info!("  Cache: in-process memory store"),
        }
        info!(
            "  Cache TTL: {} | Trending TTL: {}",
            humantime::format_duration(self.cache.search_ttl),
            humantime::format_duration(self.cache.trending_ttl)
        );
        match self.storage.backend {
            StorageBackend::Azure if self.storage.azure_connection_string.is_none() => {
                warn!("  Object storage: DISABLED (AZURE_CONNECTION_STRING not set)")
            }
            StorageBackend::Azure => info!(
                "  Object storage: Azure Blob (container: {})",
                self.storage.container_name
            ),
            StorageBackend::Local => info!(
                "  Object storage: local filesystem at {}",
                self.storage.local_path.display()
            ),
            StorageBackend::Memory => info!("  Object storage: in-memory (not durable)"),
            StorageBackend::Disabled => warn!("  Object storage: DISABLED"),
        }
        info!(
            "  Archive concurrency: {} | Upstream: {}",
            self.archive.concurrency, self.upstream.search_url
        );
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .with_context(|| format!("Invalid {name} '{value}', expected seconds"))
}
