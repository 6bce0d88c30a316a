//! Authenticate-then-search for every tool call
//!
//! [`ToolDispatcher`] is the one context object both adapters share. It
//! holds the token authority and the search backend; neither adapter keeps
//! any state of its own.

use std::sync::Arc;

use serde::Serialize;
use solr_mcp_auth::{TokenAuthority, TokenClaims};
use solr_mcp_search::SearchBackend;
use solr_mcp_types::{Document, ErrorPayload, SearchResult, ToolResponse};

use crate::schema::{DocumentToolCall, SearchToolCall};

pub const SEARCH_TOOL: &str = "search";
pub const GET_DOCUMENT_TOOL: &str = "get_document";

/// Description of the running server, served at `/server_info`
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfoPayload {
    pub name: String,
    pub version: String,
    pub collection: String,
    pub auth_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_strategy: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_scopes: Vec<String>,
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Engine connectivity as seen by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// `/health` response body
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub collection: String,
    pub auth: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_error: Option<String>,
}

pub struct ToolDispatcher {
    name: String,
    authority: Arc<TokenAuthority>,
    backend: Arc<dyn SearchBackend>,
}

impl ToolDispatcher {
    pub fn new(
        name: impl Into<String>,
        authority: Arc<TokenAuthority>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self { name: name.into(), authority, backend }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Run the `search` tool
    pub async fn dispatch_search(&self, call: SearchToolCall) -> ToolResponse<SearchResult> {
        let claims = match self.authenticate(SEARCH_TOOL, call.access_token.as_deref()).await {
            Ok(claims) => claims,
            Err(payload) => return ToolResponse::Error(payload),
        };

        let request = match call.to_request() {
            Ok(request) => request,
            Err(e) => return self.reject(SEARCH_TOOL, ErrorPayload::from(&e)),
        };

        tracing::debug!(
            subject = %claims.display_name(),
            query = %request.query(),
            rows = request.rows(),
            start = request.start(),
            "Dispatching search"
        );

        let response = match self.backend.search(&request).await {
            Ok(response) => response,
            Err(e) => ToolResponse::Error(ErrorPayload::from(&e)),
        };
        self.complete(SEARCH_TOOL, response)
    }

    /// Run the `get_document` tool
    pub async fn dispatch_get_document(&self, call: DocumentToolCall) -> ToolResponse<Document> {
        let claims = match self.authenticate(GET_DOCUMENT_TOOL, call.access_token.as_deref()).await
        {
            Ok(claims) => claims,
            Err(payload) => return ToolResponse::Error(payload),
        };

        let lookup = match call.to_lookup() {
            Ok(lookup) => lookup,
            Err(e) => return self.reject(GET_DOCUMENT_TOOL, ErrorPayload::from(&e)),
        };

        tracing::debug!(
            subject = %claims.display_name(),
            id = %lookup.id(),
            "Dispatching document lookup"
        );

        let response = match self.backend.get_document(&lookup).await {
            Ok(response) => response,
            Err(e) => ToolResponse::Error(ErrorPayload::from(&e)),
        };
        self.complete(GET_DOCUMENT_TOOL, response)
    }

    pub fn server_info(&self) -> ServerInfoPayload {
        let config = self.authority.config();
        ServerInfoPayload {
            name: self.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            collection: self.backend.collection().to_string(),
            auth_enabled: config.enabled,
            validation_strategy: config.enabled.then(|| config.strategy.to_string()),
            required_scopes: if config.enabled { config.required_scopes.clone() } else { Vec::new() },
            tools: vec![
                ToolInfo { name: SEARCH_TOOL, description: SEARCH_DESCRIPTION },
                ToolInfo { name: GET_DOCUMENT_TOOL, description: GET_DOCUMENT_DESCRIPTION },
            ],
        }
    }

    /// Ping the engine; degraded rather than failed when it is down
    pub async fn health(&self) -> HealthReport {
        let (status, engine_error) = match self.backend.ping().await {
            Ok(()) => (HealthStatus::Healthy, None),
            Err(e) => {
                tracing::warn!(error = %e, "Health check: search engine ping failed");
                (HealthStatus::Degraded, Some(e.to_string()))
            },
        };

        HealthReport {
            status,
            service: self.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            collection: self.backend.collection().to_string(),
            auth: if self.authority.is_enabled() { "enabled" } else { "disabled" },
            engine_error,
        }
    }

    async fn authenticate(
        &self,
        tool: &str,
        token: Option<&str>,
    ) -> Result<TokenClaims, ErrorPayload> {
        self.authority.authorize(token).await.map_err(|e| {
            tracing::info!(tool = %tool, kind = ?e.kind(), error = %e, "Tool call rejected by auth");
            let payload = ErrorPayload::from(&e);
            solr_mcp_observe::metrics::record_tool_call(tool, payload.kind.as_str());
            payload
        })
    }

    fn reject<T>(&self, tool: &str, payload: ErrorPayload) -> ToolResponse<T> {
        tracing::info!(tool = %tool, error = %payload.error, "Tool call rejected");
        solr_mcp_observe::metrics::record_tool_call(tool, payload.kind.as_str());
        ToolResponse::Error(payload)
    }

    fn complete<T>(&self, tool: &str, response: ToolResponse<T>) -> ToolResponse<T> {
        let outcome = response.as_error().map(|e| e.kind.as_str()).unwrap_or("success");
        solr_mcp_observe::metrics::record_tool_call(tool, outcome);
        response
    }
}

pub const SEARCH_DESCRIPTION: &str = "Search documents in Solr. Supports Solr query syntax, filter \
     queries, sorting, paging, facet counts and highlighting. Pass access_token when \
     authentication is enabled.";

pub const GET_DOCUMENT_DESCRIPTION: &str = "Fetch one document by its unique id, optionally \
     limited to a list of fields. Pass access_token when authentication is enabled.";
