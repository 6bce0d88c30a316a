//! Configuration validation
//!
//! Validates configuration values and ensures consistency

use thiserror::Error;
use url::Url;

use crate::{AuthConfig, Config, ObservabilityConfig, ServerConfig, SolrConfig};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid address '{0}': {1}")]
    InvalidAddress(String, String),

    #[error("Invalid URL for {field} '{url}': {reason}")]
    InvalidUrl { field: &'static str, url: String, reason: String },

    #[error("Invalid log level: {0} (must be one of: trace, debug, info, warn, error)")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0} (must be one of: pretty, compact, json)")]
    InvalidLogFormat(String),

    #[error("solr.collection must not be empty")]
    EmptyCollection,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("auth.{field} must be set explicitly for provider '{provider}'")]
    MissingEndpoint { field: &'static str, provider: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validate complete configuration
pub fn validate(config: &Config) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_server(&config.server) {
        errors.push(e);
    }

    errors.extend(validate_solr(&config.solr));

    if config.auth.enabled {
        errors.extend(validate_auth(&config.auth));
    }

    errors.extend(validate_observability(&config.observability));

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate the listen address is parseable
pub fn validate_server(config: &ServerConfig) -> Result<()> {
    let addr = config.listen_addr();
    addr.parse::<std::net::SocketAddr>()
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidAddress(addr, e.to_string()))
}

/// Validate the search engine section
pub fn validate_solr(config: &SolrConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = validate_url("solr.base_url", &config.base_url) {
        errors.push(e);
    }
    if config.collection.trim().is_empty() {
        errors.push(ValidationError::EmptyCollection);
    }
    if config.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("solr.connect_timeout_ms"));
    }
    if config.request_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("solr.request_timeout_ms"));
    }

    errors
}

/// Validate the auth section; only called when auth is enabled
pub fn validate_auth(config: &AuthConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = validate_url("auth.provider_url", &config.provider_url) {
        errors.push(e);
    }

    let explicit = [
        ("introspection_endpoint", &config.introspection_endpoint),
        ("jwks_endpoint", &config.jwks_endpoint),
        ("token_endpoint", &config.token_endpoint),
        ("issuer", &config.issuer),
    ];
    for (field, value) in explicit {
        match value {
            Some(url) => {
                if let Err(e) = validate_url(field, url) {
                    errors.push(e);
                }
            },
            // Only the Keycloak layout can be derived
            None if !config.is_keycloak() && field != "token_endpoint" => {
                errors.push(ValidationError::MissingEndpoint {
                    field,
                    provider: config.provider.clone(),
                });
            },
            None => {},
        }
    }

    if config.http_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("auth.http_timeout_ms"));
    }

    if config.required_scopes.is_empty() {
        tracing::warn!("auth.required_scopes is empty; any valid token will be authorized");
    }

    if config.jwks_cache_ttl == 0 {
        tracing::warn!("auth.jwks_cache_ttl is 0; the JWKS will be refetched on every validation");
    }

    if config.clock_skew_seconds > 300 {
        tracing::warn!(
            clock_skew = %config.clock_skew_seconds,
            "Clock skew tolerance is very high (> 5 minutes). \
             Recommended: 60 seconds or less."
        );
    }

    if config.client_secret.is_empty() {
        tracing::warn!("auth.client_secret is empty; confidential-client calls may be rejected");
    }

    errors
}

/// Validate logging settings
pub fn validate_observability(config: &ObservabilityConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match config.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {},
        _ => errors.push(ValidationError::InvalidLogLevel(config.log_level.clone())),
    }

    match config.log_format.to_lowercase().as_str() {
        "pretty" | "compact" | "json" => {},
        _ => errors.push(ValidationError::InvalidLogFormat(config.log_format.clone())),
    }

    if let Some(addr) = &config.metrics_listen
        && let Err(e) = addr.parse::<std::net::SocketAddr>()
    {
        errors.push(ValidationError::InvalidAddress(addr.clone(), e.to_string()));
    }

    errors
}

/// Require an absolute http(s) URL
pub fn validate_url(field: &'static str, url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
        field,
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::InvalidUrl {
            field,
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
