//! MCP stdio adapter
//!
//! Each tool deserializes its arguments, hands them to the shared
//! [`ToolDispatcher`] and returns the JSON-serialized [`ToolResponse`]. Error
//! payloads are ordinary tool output; the protocol layer never sees a failure
//! for an invalid token or a missing document.
//!
//! [`ToolResponse`]: solr_mcp_types::ToolResponse

use std::sync::Arc;

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
};

use crate::{
    dispatcher::ToolDispatcher,
    error::ApiError,
    schema::{DocumentToolCall, SearchToolCall},
};

#[derive(Clone)]
pub struct SolrMcpServer {
    dispatcher: Arc<ToolDispatcher>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SolrMcpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Search documents in Solr. Supports Solr query syntax, filter queries, sorting, paging, facet counts and highlighting. Pass access_token when authentication is enabled."
    )]
    async fn search(&self, Parameters(call): Parameters<SearchToolCall>) -> String {
        self.dispatcher.dispatch_search(call).await.to_json_string()
    }

    #[tool(
        description = "Fetch one document by its unique id, optionally limited to a list of fields. Pass access_token when authentication is enabled."
    )]
    async fn get_document(&self, Parameters(call): Parameters<DocumentToolCall>) -> String {
        self.dispatcher.dispatch_get_document(call).await.to_json_string()
    }
}

#[tool_handler]
impl ServerHandler for SolrMcpServer {
    fn get_info(&self) -> ServerInfo {
        let info = self.dispatcher.server_info();
        let auth = if info.auth_enabled {
            format!(
                "Authentication is enabled: pass an OAuth2 access token in `access_token`. Required scopes: {}.",
                info.required_scopes.join(", ")
            )
        } else {
            "Authentication is disabled.".to_string()
        };

        ServerInfo {
            server_info: Implementation {
                name: info.name,
                version: info.version,
                ..Implementation::from_build_env()
            },
            instructions: Some(format!(
                "Search the Solr collection '{}' with the `search` tool and fetch single documents with `get_document`. {auth}",
                info.collection
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve MCP over stdin/stdout until the client disconnects
pub async fn serve_stdio(dispatcher: Arc<ToolDispatcher>) -> crate::error::Result<()> {
    tracing::info!(name = %dispatcher.name(), "Starting MCP server on stdio");

    let service = SolrMcpServer::new(dispatcher)
        .serve(stdio())
        .await
        .map_err(|e| ApiError::Server(format!("Failed to start MCP transport: {}", e)))?;

    service
        .waiting()
        .await
        .map_err(|e| ApiError::Server(format!("MCP service terminated abnormally: {}", e)))?;

    tracing::info!("MCP client disconnected");
    Ok(())
}
