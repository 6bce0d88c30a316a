use solr_mcp_types::{ErrorKind, ErrorPayload};
use thiserror::Error;

/// Longest provider response body carried in an error message
const MAX_BODY_IN_ERROR: usize = 512;

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Auth is enabled and the call carried no token
    #[error("Authentication required: no access token provided")]
    TokenMissing,

    /// Malformed JWT - cannot be decoded
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// Signature verification failed
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Issuer doesn't match the configured realm
    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    /// Audience doesn't match expected value
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// Algorithm other than RS256
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No key in the realm's JWKS matches the token's `kid`
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Key ID from the token header
        kid: String,
    },

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Introspection reported `active: false`
    #[error("Token is not active")]
    TokenInactive,

    /// Valid token without every required scope
    #[error("Insufficient scopes: missing {}", missing.join(" "))]
    InsufficientScopes {
        /// Required scopes absent from the token
        missing: Vec<String>,
        /// Every configured required scope
        required: Vec<String>,
        /// Scopes the token carries
        actual: Vec<String>,
    },

    /// Transport failure or timeout talking to the identity provider
    #[error("Identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// Identity provider answered with a non-success status
    #[error("Identity provider rejected request to {endpoint} (HTTP {status}): {body}")]
    ProviderRejected {
        /// Endpoint URL called
        endpoint: String,
        /// HTTP status returned
        status: u16,
        /// Provider response body, truncated
        body: String,
    },

    /// Identity provider answered 2xx with an unusable body
    #[error("Invalid identity provider response: {0}")]
    InvalidProviderResponse(String),

    /// Local misconfiguration (e.g. no service account configured)
    #[error("Auth configuration error: {0}")]
    Configuration(String),
}

/// The failure categories callers render differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    TokenMissing,
    TokenInvalid,
    TokenExpired,
    InsufficientScopes,
    ProviderUnreachable,
}

impl AuthError {
    /// Collapse onto the caller-facing taxonomy
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::TokenMissing => AuthErrorKind::TokenMissing,
            AuthError::InvalidTokenFormat(_)
            | AuthError::InvalidSignature
            | AuthError::InvalidIssuer(_)
            | AuthError::InvalidAudience(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::KeyNotFound { .. }
            | AuthError::TokenInactive => AuthErrorKind::TokenInvalid,
            AuthError::TokenExpired => AuthErrorKind::TokenExpired,
            AuthError::InsufficientScopes { .. } => AuthErrorKind::InsufficientScopes,
            AuthError::ProviderUnreachable(_)
            | AuthError::ProviderRejected { .. }
            | AuthError::InvalidProviderResponse(_)
            | AuthError::Configuration(_) => AuthErrorKind::ProviderUnreachable,
        }
    }

    /// Build a `ProviderRejected`, truncating the body
    pub fn rejected(endpoint: &str, status: u16, body: &str) -> Self {
        let body = if body.len() > MAX_BODY_IN_ERROR {
            let mut end = MAX_BODY_IN_ERROR;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &body[..end])
        } else {
            body.to_string()
        };
        AuthError::ProviderRejected { endpoint: endpoint.to_string(), status, body }
    }

    /// Short label for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self.kind() {
            AuthErrorKind::TokenMissing => "missing",
            AuthErrorKind::TokenInvalid => "invalid",
            AuthErrorKind::TokenExpired => "expired",
            AuthErrorKind::InsufficientScopes => "insufficient_scopes",
            AuthErrorKind::ProviderUnreachable => "provider_unreachable",
        }
    }
}

impl From<AuthErrorKind> for ErrorKind {
    fn from(kind: AuthErrorKind) -> Self {
        match kind {
            AuthErrorKind::TokenMissing => ErrorKind::TokenMissing,
            AuthErrorKind::TokenInvalid => ErrorKind::TokenInvalid,
            AuthErrorKind::TokenExpired => ErrorKind::TokenExpired,
            AuthErrorKind::InsufficientScopes => ErrorKind::InsufficientScopes,
            AuthErrorKind::ProviderUnreachable => ErrorKind::ProviderUnreachable,
        }
    }
}

impl From<&AuthError> for ErrorPayload {
    fn from(err: &AuthError) -> Self {
        ErrorPayload::new(err.kind().into(), err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => AuthError::InvalidTokenFormat("Invalid JWT structure".into()),
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => {
                AuthError::InvalidTokenFormat("Token not yet valid".into())
            },
            ErrorKind::InvalidAudience => {
                AuthError::InvalidAudience("Audience validation failed".into())
            },
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer("Issuer validation failed".into()),
            ErrorKind::InvalidAlgorithm => {
                AuthError::UnsupportedAlgorithm("Algorithm not supported".into())
            },
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::InvalidTokenFormat(format!("Missing claim: {}", claim))
            },
            _ => AuthError::InvalidTokenFormat(format!("JWT error: {}", err)),
        }
    }
}

/// Result type alias for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;
