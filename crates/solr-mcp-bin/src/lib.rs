//! # Solr MCP Binary
//!
//! Startup wiring for the `solr-mcp` executable.

#![deny(unsafe_code)]

pub mod context;

pub use context::{AppContext, StartupReport};
