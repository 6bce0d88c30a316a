//! # Solr MCP Types
//!
//! Shared type definitions for the Solr MCP gateway.
//!
//! Requests are built once at the invocation boundary and never mutated
//! afterwards. Results are produced fresh per request. Every tool-level
//! outcome is a [`ToolResponse`]: either a result payload or an
//! [`ErrorPayload`] rendered as `{"error": "..."}`.

#![deny(unsafe_code)]

// ============================================================================
// Requests
// ============================================================================

pub mod request;

pub use request::{DEFAULT_ROWS, DocumentLookup, MATCH_ALL, SearchRequest};

// ============================================================================
// Results
// ============================================================================

pub mod result;

pub use result::{Document, FacetCounts, Highlighting, SearchResult, value_to_string};

// ============================================================================
// Tool responses
// ============================================================================

pub mod response;

pub use response::{ErrorKind, ErrorPayload, ToolResponse};
