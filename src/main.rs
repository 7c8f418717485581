use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emote_proxy::{
    config::{CacheBackend, Config},
    emote_assets::{AssetFetcher, BlobStore, EmoteArchiver, HttpAssetFetcher, ObjectBlobStore},
    services::{
        EmoteService, ResponseCache,
        response_cache::{CacheStore, MemoryCacheStore, RedisCacheStore},
    },
    sources::{CatalogSource, SevenTvClient},
    web::{AppState, WebServer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "emote-proxy")]
#[command(version)]
#[command(about = "Caching and archival proxy for 7TV emote search and trending listings")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print the effective configuration, secrets masked, and exit
    #[arg(long)]
    dump_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("emote_proxy={},tower_http=trace", cli.log_level)
    } else {
        format!("emote_proxy={}", cli.log_level)
    };
    let (text_layer, json_layer) = match cli.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(text_layer)
        .with(json_layer)
        .init();

    let mut config = Config::load(Some(&cli.config))?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    if cli.dump_config {
        println!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    info!("Starting Emote Proxy v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let cache_store = build_cache_store(&config).await;
    let cache = ResponseCache::new(cache_store, config.cache.search_ttl, config.cache.trending_ttl);

    let storage = ObjectBlobStore::from_config(&config.storage)
        .context("Failed to initialise object storage")?
        .map(|store| Arc::new(store) as Arc<dyn BlobStore>);
    if storage.is_none() {
        warn!("Object storage unavailable: searches will return no archived emotes");
    }

    let fetcher: Arc<dyn AssetFetcher> = Arc::new(HttpAssetFetcher::new(
        config.archive.fetch_timeout,
        &config.upstream.user_agent,
    )?);
    let archiver = EmoteArchiver::new(storage, fetcher, config.archive.concurrency);

    let catalog: Arc<dyn CatalogSource> = Arc::new(SevenTvClient::new(&config.upstream)?);
    info!("Catalog source '{}' initialised", catalog.name());

    let config = Arc::new(config);
    let emotes = EmoteService::new(catalog, archiver, cache, config.limits.clone());
    let web_server = WebServer::new(AppState::new(config, emotes))?;

    info!("Starting web server on {}", web_server.addr());
    web_server.serve_with_cancellation(None).await?;

    info!("Emote Proxy stopped");
    Ok(())
}

/// Connect the configured cache store, falling back to memory when Redis is unreachable
async fn build_cache_store(config: &Config) -> Arc<dyn CacheStore> {
    match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
        CacheBackend::Redis => {
            let url = config.cache.redis_connection_url();
            match RedisCacheStore::connect(&url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    error!(
                        "Redis unavailable, caching in process memory instead: {}",
                        e
                    );
                    Arc::new(MemoryCacheStore::new())
                }
            }
        }
    }
}
