//! # Solr MCP Observe - Observability Layer
//!
//! Structured logging and metrics for the gateway.
//!
//! Logs always go to stderr: in MCP mode stdout carries the protocol stream.

use std::net::SocketAddr;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

pub mod logging;
pub mod metrics;

pub use logging::{LogConfig, LogFormat, init_logging};

/// Register metric descriptions and, when an address is given, serve them
///
/// Without an address the `metrics` facade keeps its no-op recorder.
pub fn init_metrics(listen: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = listen {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

        tracing::info!(listen = %addr, "Metrics exporter initialized");
    }

    metrics::init_metrics_descriptions();

    Ok(())
}
