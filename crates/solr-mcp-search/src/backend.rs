use async_trait::async_trait;
use solr_mcp_types::{Document, DocumentLookup, SearchRequest, SearchResult, ToolResponse};

use crate::error::{EngineQueryError, Result};

/// The seam between the tool dispatcher and a search engine
///
/// `search` and `get_document` never fail for transport, engine or parse
/// problems; those come back as error payloads. Only an engine-reported
/// query error is returned as `Err`.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Collection (core) queried by this backend
    fn collection(&self) -> &str;

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<ToolResponse<SearchResult>, EngineQueryError>;

    async fn get_document(
        &self,
        lookup: &DocumentLookup,
    ) -> std::result::Result<ToolResponse<Document>, EngineQueryError>;

    /// Connectivity check
    async fn ping(&self) -> Result<()>;
}
