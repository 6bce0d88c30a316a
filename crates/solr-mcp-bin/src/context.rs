//! Application context
//!
//! Everything the server shares between calls is built here once, passed
//! explicitly to the adapters, and released by [`AppContext::shutdown`].

use std::sync::Arc;

use anyhow::{Context, Result};
use solr_mcp_api::ToolDispatcher;
use solr_mcp_auth::TokenAuthority;
use solr_mcp_config::Config;
use solr_mcp_search::{SearchBackend, SolrGateway};

/// Outcome of the non-fatal startup checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub engine_reachable: bool,
    /// `None` when no service account is configured
    pub service_token: Option<bool>,
}

pub struct AppContext {
    config: Config,
    authority: Arc<TokenAuthority>,
    gateway: Arc<SolrGateway>,
    dispatcher: Arc<ToolDispatcher>,
}

impl AppContext {
    /// Build the token authority, engine gateway and dispatcher
    pub fn build(config: Config) -> Result<Self> {
        let authority = Arc::new(
            TokenAuthority::new(config.auth.resolve())
                .context("Failed to initialize token authority")?,
        );
        let gateway =
            Arc::new(SolrGateway::new(&config.solr).context("Failed to initialize Solr gateway")?);

        let backend: Arc<dyn SearchBackend> = gateway.clone();
        let dispatcher =
            Arc::new(ToolDispatcher::new(config.server.name.clone(), authority.clone(), backend));

        tracing::info!(
            name = %config.server.name,
            select_url = %gateway.select_url(),
            auth_enabled = authority.is_enabled(),
            "Application context initialized"
        );

        Ok(Self { config, authority, gateway, dispatcher })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    pub fn dispatcher(&self) -> Arc<ToolDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Ping Solr and, with a service account, fetch a token
    ///
    /// Neither failure stops startup; both are logged.
    pub async fn startup_checks(&self) -> StartupReport {
        let engine_reachable = match self.gateway.try_ping().await {
            Ok(()) => {
                tracing::info!(collection = %self.config.solr.collection, "Solr reachable");
                true
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    base_url = %self.config.solr.base_url,
                    "Solr ping failed; continuing, searches will report the engine as unreachable"
                );
                false
            },
        };

        let service_token = if self.authority.is_enabled() && self.config.auth.auto_refresh.is_some()
        {
            match self.authority.token_client().service_token().await {
                Ok(_) => {
                    tracing::info!("Service account token acquired");
                    Some(true)
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to acquire service account token");
                    Some(false)
                },
            }
        } else {
            None
        };

        StartupReport { engine_reachable, service_token }
    }

    /// Release shared resources
    ///
    /// Drops the cached signing keys so nothing outlives the context.
    pub async fn shutdown(self) {
        tracing::info!(name = %self.config.server.name, "Shutting down");
        self.authority.invalidate_jwks().await;
        drop(self.dispatcher);
        drop(self.gateway);
        drop(self.authority);
        tracing::info!("Shutdown complete");
    }
}
