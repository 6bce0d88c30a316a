//! # Solr MCP Search - Engine Gateway
//!
//! Turns a [`SearchRequest`] or [`DocumentLookup`] into a single query
//! against Solr's `select` handler and normalizes both success and failure.
//!
//! Failures split four ways:
//!
//! - **Unreachable**: connect error or timeout.
//! - **Query error**: a 4xx with Solr's structured `error` body. Returned as
//!   `Err(EngineQueryError)` so the caller can report bad input.
//! - **Engine failure**: any other non-success status, message forwarded.
//! - **Malformed response**: 2xx without the `response` envelope.
//!
//! A zero-result id lookup is a normal `NotFound` payload, not a fault.

#![deny(unsafe_code)]

// ============================================================================
// Modules
// ============================================================================

pub mod backend;
pub mod error;
pub mod gateway;
mod wire;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::SearchBackend;
pub use error::{EngineQueryError, Result, SearchError};
pub use gateway::SolrGateway;
pub use solr_mcp_types::{Document, DocumentLookup, SearchRequest, SearchResult, ToolResponse};
