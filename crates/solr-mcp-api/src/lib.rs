//! # Solr MCP API - Invocation Boundary
//!
//! Two adapters over one [`ToolDispatcher`]:
//!
//! - [`mcp`]: rmcp server on stdio exposing the `search` and `get_document`
//!   tools
//! - [`rest`]: axum mirror with `/server_info`, `/tool/*`,
//!   `/resource/search/{query}` and `/health`
//!
//! Every call is authenticated before the request is validated or the engine
//! is contacted. Results and failures both come back as a
//! [`ToolResponse`](solr_mcp_types::ToolResponse).

#![deny(unsafe_code)]

// ============================================================================
// Modules
// ============================================================================

pub mod dispatcher;
pub mod error;
pub mod mcp;
pub mod rest;
pub mod schema;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{HealthReport, HealthStatus, ServerInfoPayload, ToolDispatcher};
pub use error::{ApiError, Result, payload_response, status_for};
pub use mcp::{SolrMcpServer, serve_stdio};
pub use rest::{AppState, router, serve_http};
pub use schema::{DocumentToolCall, SearchToolCall};
