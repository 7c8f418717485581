//! Web layer
//!
//! Axum router, shared handler state and the server lifecycle. Clients are
//! constructed once in `main`, wrapped in [`AppState`] and shared by every
//! handler through cheap clones.

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::services::EmoteService;

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod utils;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub emotes: EmoteService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, emotes: EmoteService) -> Self {
        Self {
            config,
            emotes,
            started_at: Instant::now(),
        }
    }
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", state.config.web.host, state.config.web.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

        Ok(Self {
            app: Self::create_router(state),
            addr,
        })
    }

    /// Build the full router with its middleware stack
    pub fn create_router(state: AppState) -> Router {
        let request_timeout = state.config.web.request_timeout;

        Router::new()
            .route("/", get(handlers::index::index))
            .route("/health", get(handlers::health::health_check))
            .route("/api/openapi.json", get(openapi::openapi_json))
            .route("/api/search-emotes", post(handlers::emotes::search_emotes))
            .route("/api/trending/emotes", get(handlers::trending::trending_emotes))
            .route(
                "/api/storage/trending-emotes",
                get(handlers::storage::list_trending_storage),
            )
            .route(
                "/api/storage/emote-api",
                get(handlers::storage::list_search_storage),
            )
            .route("/api/cache/status", get(handlers::cache::cache_status))
            .route("/api/cache/clear", post(handlers::cache::clear_cache))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(middleware::process_time_middleware))
            .with_state(state)
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until ctrl-c, SIGTERM, or the optional token is cancelled
    pub async fn serve_with_cancellation(self, cancellation_token: Option<CancellationToken>) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.addr, e))?;
        tracing::info!("Web server listening on http://{}", self.addr);

        let shutdown_signal = async move {
            match cancellation_token {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            tracing::info!("Web server received cancellation signal, shutting down gracefully");
                        }
                        _ = os_shutdown_signal() => {}
                    }
                }
                None => os_shutdown_signal().await,
            }
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        Ok(())
    }
}

async fn os_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
