use solr_mcp_types::{ErrorKind, ErrorPayload};
use thiserror::Error;

/// Longest engine response body carried in an error message
const MAX_BODY_IN_ERROR: usize = 512;

/// The engine rejected the query itself
///
/// This is the one engine failure that propagates out of
/// [`crate::SolrGateway::search`] instead of being flattened into an error
/// payload, so callers can tell bad input from a system problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid query (HTTP {status}): {message}")]
pub struct EngineQueryError {
    /// HTTP status returned by the engine
    pub status: u16,
    /// The engine's `error.msg`
    pub message: String,
    /// The engine's `error.code`, when present
    pub code: Option<i64>,
}

impl From<&EngineQueryError> for ErrorPayload {
    fn from(err: &EngineQueryError) -> Self {
        ErrorPayload::new(ErrorKind::EngineQueryError, err.to_string())
    }
}

/// Search gateway errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Connect failure, timeout or other transport error
    #[error("Search engine unreachable: {0}")]
    EngineUnreachable(String),

    /// 4xx with a structured error body
    #[error(transparent)]
    EngineQuery(#[from] EngineQueryError),

    /// Any other non-success status, message forwarded from the engine
    #[error("Search engine error (HTTP {status}): {message}")]
    EngineFailure { status: u16, message: String },

    /// 2xx with a body missing the expected envelope
    #[error("Malformed search engine response: {0}")]
    MalformedResponse(String),

    /// An id lookup matched nothing
    #[error("Document with id {id} not found")]
    NotFound { id: String },

    /// The HTTP client could not be built
    #[error("Search gateway configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::EngineUnreachable(_) => ErrorKind::EngineUnreachable,
            SearchError::EngineQuery(_) => ErrorKind::EngineQueryError,
            SearchError::EngineFailure { .. } | SearchError::Configuration(_) => {
                ErrorKind::EngineFailure
            },
            SearchError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            SearchError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Short label for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self.kind() {
            ErrorKind::EngineUnreachable => "unreachable",
            ErrorKind::EngineQueryError => "query_error",
            ErrorKind::MalformedResponse => "malformed",
            ErrorKind::NotFound => "not_found",
            _ => "engine_error",
        }
    }
}

impl From<&SearchError> for ErrorPayload {
    fn from(err: &SearchError) -> Self {
        ErrorPayload::new(err.kind(), err.to_string())
    }
}

/// Cut an engine body down to a loggable length
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_IN_ERROR {
        return body.to_string();
    }
    let mut end = MAX_BODY_IN_ERROR;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
