//! TaC Engine server binary
//!
//! Starts the HTTP server for claim verification.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tac_server::config::{ApiKey, ServerConfig, API_KEY_ENV};
use tac_server::{start_server, ServerError};
use tracing_subscriber::EnvFilter;

/// TaC Engine - sustainability claim verification proxy
#[derive(Debug, Parser)]
#[command(name = "tac-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TAC_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the bind address
    #[arg(long)]
    bind_address: Option<String>,

    /// Override the bind port
    #[arg(short = 'p', long)]
    bind_port: Option<u16>,

    /// Enable Google Search grounding
    #[arg(long)]
    grounding: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            tracing::info!("No config file specified, using defaults");
            ServerConfig::default()
        }
    };

    if let Some(address) = cli.bind_address {
        config.bind_address = address;
    }
    if let Some(port) = cli.bind_port {
        config.bind_port = port;
    }
    if cli.grounding {
        config.upstream.grounding = true;
    }

    let api_key = cli.api_key.and_then(ApiKey::new);
    start_server(config, api_key).await
}
