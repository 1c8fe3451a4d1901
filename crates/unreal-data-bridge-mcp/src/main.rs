use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use unreal_data_bridge_mcp::config;
use unreal_data_bridge_mcp::observability::{init_observability, shutdown_observability};
use unreal_data_bridge_mcp::transport::run_transport;
use unreal_data_bridge_mcp::{ConnectionManager, ServerHandler};

#[derive(Parser, Debug)]
#[command(name = "unreal-data-bridge-mcp")]
#[command(
    about = "MCP server bridging AI tools to Unreal Editor data",
    long_about = None
)]
#[command(version)]
struct Args {
    /// Editor plugin host
    #[arg(long)]
    host: Option<String>,

    /// Editor plugin TCP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for each response chunk from the editor
    #[arg(long)]
    read_timeout: Option<u64>,

    /// Character budget for a single tool response
    #[arg(long)]
    max_response_chars: Option<usize>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Precedence: CLI > env > file > defaults
    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if let Some(host) = args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(secs) = args.read_timeout {
        builder = builder.read_timeout(Duration::from_secs(secs));
    }
    if let Some(max_chars) = args.max_response_chars {
        builder = builder.max_response_chars(max_chars);
    }
    if args.no_cache {
        builder = builder.cache_enabled(false);
    }
    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }
    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    let connection = Arc::new(ConnectionManager::new(
        config.connection.clone(),
        config.cache,
    ));
    let handler = ServerHandler::new(connection, config.size_guard());

    tracing::info!("Starting MCP server for Unreal Editor data");
    tracing::info!("Editor address: {}", config.connection.address());
    tracing::info!("Read timeout: {:?}", config.connection.read_timeout);
    tracing::info!("Cache enabled: {}", config.cache.enabled);
    tracing::info!("Response budget: {} chars", config.response.max_chars);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    let result = run_transport(handler, shutdown).await;

    shutdown_observability();

    result.map_err(Into::into)
}
