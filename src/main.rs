use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voice_chat_gateway::{ServerConfig, core::ChatMode, routes, state::AppState};

/// Voice chat gateway - streams chat replies into speech over WebSocket
#[derive(Parser, Debug)]
#[command(name = "voice-chat-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Reply generation mode: streaming, complete or sdk
    #[arg(long = "client", value_name = "MODE", value_parser = parse_chat_mode)]
    client: Option<ChatMode>,
}

fn parse_chat_mode(value: &str) -> Result<ChatMode, String> {
    ChatMode::parse(value)
        .ok_or_else(|| format!("unknown mode '{value}', expected streaming, complete or sdk"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize crypto provider for TLS connections
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Load configuration from file or environment
    let mut config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    // Command line flags win over every other source
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(mode) = cli.client {
        config.chat_mode = mode;
    }

    let address = config.address();
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    let app_state =
        AppState::new(config).map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind(&socket_addr).await?;
    info!("Server listening on http://{}", socket_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
