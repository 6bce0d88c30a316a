use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use solr_mcp_auth::AuthError;
use solr_mcp_search::{EngineQueryError, SearchError};
use solr_mcp_types::{ErrorKind, ErrorPayload};
use thiserror::Error;

/// Errors at the invocation boundary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    EngineQuery(#[from] EngineQueryError),

    /// Transport setup or serving failed
    #[error("Server error: {0}")]
    Server(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::Auth(e) => e.kind().into(),
            ApiError::Search(e) => e.kind(),
            ApiError::EngineQuery(_) => ErrorKind::EngineQueryError,
            ApiError::Server(_) => ErrorKind::EngineFailure,
        }
    }
}

impl From<&ApiError> for ErrorPayload {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Auth(e) => ErrorPayload::from(e),
            ApiError::Search(e) => ErrorPayload::from(e),
            ApiError::EngineQuery(e) => ErrorPayload::from(e),
            other => ErrorPayload::new(other.kind(), other.to_string()),
        }
    }
}

/// HTTP status the REST mirror uses for each failure category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::TokenMissing | ErrorKind::TokenInvalid | ErrorKind::TokenExpired => {
            StatusCode::UNAUTHORIZED
        },
        ErrorKind::InsufficientScopes => StatusCode::FORBIDDEN,
        ErrorKind::ProviderUnreachable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::EngineQueryError | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::EngineUnreachable | ErrorKind::EngineFailure | ErrorKind::MalformedResponse => {
            StatusCode::BAD_GATEWAY
        },
    }
}

/// Render an error payload with its status and, for 401, a challenge
pub fn payload_response(payload: ErrorPayload) -> Response {
    let status = status_for(payload.kind);
    let challenge = match payload.kind {
        ErrorKind::TokenMissing => Some(HeaderValue::from_static("Bearer realm=\"solr-mcp\"")),
        ErrorKind::TokenInvalid => Some(HeaderValue::from_static(
            "Bearer realm=\"solr-mcp\", error=\"invalid_token\"",
        )),
        ErrorKind::TokenExpired => Some(HeaderValue::from_static(
            "Bearer realm=\"solr-mcp\", error=\"invalid_token\", error_description=\"token expired\"",
        )),
        ErrorKind::InsufficientScopes => Some(HeaderValue::from_static(
            "Bearer realm=\"solr-mcp\", error=\"insufficient_scope\"",
        )),
        _ => None,
    };

    let mut response = (status, Json(payload)).into_response();
    if let Some(value) = challenge {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        payload_response(ErrorPayload::from(&self))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
