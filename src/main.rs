use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use captioner::api::{start_server, AppState, ServerConfig};
use captioner::caption::CaptionTransformer;
use captioner::contracts::{CaptionerError, SequenceCounter};
use captioner::counter::{FileSequenceCounter, PersistRetryConfig};
use captioner::dispatch::{Dispatcher, PipelineConfig};
use captioner::metrics::DispatchMetrics;

/// Loads the caption rules and opens the counter store.
fn build_state() -> Result<Arc<AppState<FileSequenceCounter>>, CaptionerError> {
    // Caption rules; a bad rule file is fatal
    let pipeline = PipelineConfig::from_env()?;
    let transformer = CaptionTransformer::new(pipeline.caption)?;
    tracing::info!(mode = transformer.mode().name(), "Caption rules loaded");

    // Sequence counter
    let state_file =
        std::env::var("CAPTIONER_STATE_FILE").unwrap_or_else(|_| "numbering_state.txt".into());
    let counter = Arc::new(
        FileSequenceCounter::with_persistence(&state_file)
            .with_retry(PersistRetryConfig::from_env()),
    );
    let next = counter.current()?;
    tracing::info!(state_file = %state_file, next, "Sequence counter ready");

    let dispatcher = Dispatcher::new(
        counter,
        Arc::new(transformer),
        pipeline.routing,
        Arc::new(DispatchMetrics::new()),
    );
    Ok(Arc::new(AppState::new(Arc::new(dispatcher))))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("captioner=info".parse()?))
        .init();

    tracing::info!("Captioner starting...");

    let state = build_state()?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown requested");
    };

    start_server(ServerConfig::from_env(), state, shutdown).await?;

    tracing::info!("Captioner stopped");
    Ok(())
}
