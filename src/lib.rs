pub mod api;
pub mod chat;
pub mod config;
pub mod generation;
pub mod models;
pub mod report;
pub mod statistics;

use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, ServerError};
use crate::config::ServiceConfig;
use crate::generation::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Cannot initialise AI client: {0}")]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env();
    tracing::info!(
        bind = %config.bind_addr,
        ai_configured = config.ai_configured(),
        models = ?config.model_candidates,
        attempt_timeout_secs = config.attempt_timeout.as_secs(),
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr;
    let ctx = ApiContext::new(config)?;
    let mut server = api::start_server(ctx, bind_addr).await?;

    shutdown_signal().await;
    server.shutdown();
    server.wait().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
