//! Tool-level response envelopes

use std::fmt;

use serde::Serialize;

/// Normalized failure categories surfaced at the invocation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Auth is enabled and the call carried no token
    TokenMissing,
    /// Signature, issuer, audience, format or activity failure
    TokenInvalid,
    /// Valid signature, past expiry
    TokenExpired,
    /// Valid token lacking at least one required scope
    InsufficientScopes,
    /// The identity provider could not be reached or used
    ProviderUnreachable,
    /// The search engine could not be reached
    EngineUnreachable,
    /// The search engine failed internally (5xx)
    EngineFailure,
    /// The search engine rejected the query itself (4xx)
    EngineQueryError,
    /// The search engine answered with an unexpected body
    MalformedResponse,
    /// An id lookup matched nothing
    NotFound,
    /// The tool call itself was malformed
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TokenMissing => "token_missing",
            ErrorKind::TokenInvalid => "token_invalid",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::InsufficientScopes => "insufficient_scopes",
            ErrorKind::ProviderUnreachable => "provider_unreachable",
            ErrorKind::EngineUnreachable => "engine_unreachable",
            ErrorKind::EngineFailure => "engine_failure",
            ErrorKind::EngineQueryError => "engine_query_error",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }

    /// Whether the failure came from authentication rather than search
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ErrorKind::TokenMissing
                | ErrorKind::TokenInvalid
                | ErrorKind::TokenExpired
                | ErrorKind::InsufficientScopes
                | ErrorKind::ProviderUnreachable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{"error": "...", "detail": "..."}` payload
///
/// `kind` is not serialized; adapters use it to pick a status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub kind: ErrorKind,
}

impl ErrorPayload {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self { error: error.into(), detail: None, kind }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.error, detail),
            None => f.write_str(&self.error),
        }
    }
}

/// Either a result payload or an error payload, never a fault
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse<T> {
    Ok(T),
    Error(ErrorPayload),
}

impl<T> ToolResponse<T> {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ToolResponse::Error(ErrorPayload::new(kind, message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Error(_))
    }

    /// The error payload, if this is a failure
    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            ToolResponse::Error(payload) => Some(payload),
            ToolResponse::Ok(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, ErrorPayload> {
        match self {
            ToolResponse::Ok(value) => Ok(value),
            ToolResponse::Error(payload) => Err(payload),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ToolResponse<U> {
        match self {
            ToolResponse::Ok(value) => ToolResponse::Ok(f(value)),
            ToolResponse::Error(payload) => ToolResponse::Error(payload),
        }
    }
}

impl<T: Serialize> ToolResponse<T> {
    /// Pretty JSON text, as returned to MCP clients
    ///
    /// Serialization failure becomes an error payload rather than a panic.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            let payload = ErrorPayload::new(ErrorKind::MalformedResponse, e.to_string());
            serde_json::json!({ "error": payload.error }).to_string()
        })
    }
}

impl<T> From<ErrorPayload> for ToolResponse<T> {
    fn from(payload: ErrorPayload) -> Self {
        ToolResponse::Error(payload)
    }
}
