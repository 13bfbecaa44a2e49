mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::contracts::SequenceCounter;

pub use handlers::{
    AppState, DispatchStats, ErrorResponse, PrepareCaptionRequest, PrepareCaptionResponse,
    SequenceResponse, SetSequenceRequest, StatsResponse,
};

/// Creates the admin API router.
pub fn create_router<S: SequenceCounter + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats::<S>))
        .route("/metrics", get(handlers::metrics::<S>))
        .route(
            "/sequence",
            get(handlers::get_sequence::<S>).put(handlers::set_sequence::<S>),
        )
        .route("/sequence/reset", post(handlers::reset_sequence::<S>))
        .route("/captions", post(handlers::prepare_caption::<S>))
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Creates a config from environment variables.
    ///
    /// Reads:
    /// - `CAPTIONER_HOST`: Bind address (default: 0.0.0.0)
    /// - `CAPTIONER_PORT`: Port (default: 8000)
    pub fn from_env() -> Self {
        let default = Self::default();

        let host = std::env::var("CAPTIONER_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(default.host);

        let port = std::env::var("CAPTIONER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(default.port);

        Self { host, port }
    }
}

/// Starts the HTTP server.
pub async fn start_server<S, F>(
    config: ServerConfig,
    state: Arc<AppState<S>>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: SequenceCounter + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
