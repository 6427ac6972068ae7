//! TaC Engine Server
//!
//! HTTP front end for the claim verification proxy, the ledger and the
//! risk simulator.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ApiKey, ServerConfig};
use handlers::{create_router, AppState};
use std::sync::Arc;
use tac_llm::{GeminiProvider, LlmError};
use tac_store::InMemoryLedger;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Upstream provider could not be created
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build application state backed by the Gemini provider
pub fn build_state(
    config: &ServerConfig,
    api_key: Option<ApiKey>,
) -> Result<AppState, ServerError> {
    config.validate()?;
    let generator = GeminiProvider::new(config.upstream.gemini_config())?;
    let ledger = InMemoryLedger::new().with_max_entries(config.ledger.max_entries);
    info!("Ledger retains the newest {} entries", ledger.max_entries());

    Ok(AppState {
        generator: Arc::new(generator),
        api_key,
        ledger: Arc::new(ledger),
        grounding: config.upstream.grounding,
    })
}

/// Start the HTTP server
///
/// A missing API key does not prevent start-up; verification requests
/// are rejected until one is configured.
pub async fn start_server(config: ServerConfig, api_key: Option<ApiKey>) -> Result<(), ServerError> {
    info!("Starting TaC Engine server");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Upstream model: {} (grounding {})",
        config.upstream.model, config.upstream.grounding
    );
    if api_key.is_none() {
        warn!(
            "{} is not set; verification requests will fail with 500",
            config::API_KEY_ENV
        );
    }

    let state = build_state(&config, api_key)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
