//! # Solr MCP Gateway Binary
//!
//! Serves Solr search as MCP tools on stdio, or as the REST mirror over HTTP.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use solr_mcp_bin::AppContext;
use solr_mcp_observe::LogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// MCP over stdin/stdout
    Mcp,
    /// REST mirror over HTTP
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "solr-mcp")]
#[command(about = "Solr search gateway for MCP clients", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SOLR_MCP_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Transport to serve
    #[arg(short, long, value_enum, default_value_t = Mode::Mcp)]
    mode: Mode,

    /// HTTP port (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = solr_mcp_config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;

    // Override with CLI args
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize observability
    solr_mcp_observe::init_logging(LogConfig::from_settings(
        &config.observability.log_level,
        &config.observability.log_format,
    ))?;

    let metrics_listen = config
        .observability
        .metrics_listen
        .as_deref()
        .map(|addr| addr.parse::<SocketAddr>())
        .transpose()
        .context("Invalid observability.metrics_listen")?;
    solr_mcp_observe::init_metrics(metrics_listen)?;

    // Validate configuration
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        config = %args.config,
        mode = ?args.mode,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Solr MCP gateway"
    );

    let context = AppContext::build(config)?;
    context.startup_checks().await;

    let served = match args.mode {
        Mode::Mcp => {
            tokio::select! {
                result = solr_mcp_api::serve_stdio(context.dispatcher()) => result,
                _ = shutdown_signal() => Ok(()),
            }
        },
        Mode::Http => {
            let addr: SocketAddr = context
                .config()
                .server
                .listen_addr()
                .parse()
                .context("Invalid server listen address")?;
            let router = solr_mcp_api::router(context.dispatcher());
            solr_mcp_api::serve_http(router, addr, shutdown_signal()).await
        },
    };

    context.shutdown().await;
    served?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
