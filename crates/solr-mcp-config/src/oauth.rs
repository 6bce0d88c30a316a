//! Resolved identity-provider configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::AuthConfig;

/// How a bearer token is validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStrategy {
    /// Verify the signature against the cached JWKS, offline
    #[default]
    Local,
    /// Ask the provider's introspection endpoint; catches revocation
    Introspect,
}

impl ValidationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStrategy::Local => "local",
            ValidationStrategy::Introspect => "introspect",
        }
    }
}

impl std::fmt::Display for ValidationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-account credentials for the password grant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRefreshCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AutoRefreshCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoRefreshCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable, fully derived identity-provider configuration
///
/// Built once at startup by [`AuthConfig::resolve`]. When `enabled` is false
/// nothing else here is consulted.
#[derive(Clone)]
pub struct OAuthConfig {
    pub enabled: bool,
    pub provider: String,
    pub provider_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub required_scopes: Vec<String>,
    pub audience: String,
    pub issuer: String,
    pub introspection_endpoint: String,
    pub jwks_endpoint: String,
    pub token_endpoint: String,
    pub jwks_cache_ttl: Duration,
    /// An unknown `kid` refetches the JWKS only once the cached set is this old
    pub jwks_min_refresh_interval: Duration,
    pub clock_skew: Duration,
    pub strategy: ValidationStrategy,
    pub http_timeout: Duration,
    pub auto_refresh: Option<AutoRefreshCredentials>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("required_scopes", &self.required_scopes)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("introspection_endpoint", &self.introspection_endpoint)
            .field("jwks_endpoint", &self.jwks_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl OAuthConfig {
    /// Configuration with authentication turned off
    pub fn disabled() -> Self {
        AuthConfig::default().resolve()
    }
}

impl AuthConfig {
    /// Derive every endpoint not set explicitly
    ///
    /// Keycloak layout: `{provider_url}/realms/{realm}/protocol/openid-connect/...`.
    pub fn resolve(&self) -> OAuthConfig {
        let realm_url = self.realm_url();
        let oidc = format!("{realm_url}/protocol/openid-connect");

        OAuthConfig {
            enabled: self.enabled,
            provider: self.provider.clone(),
            provider_url: self.provider_url.trim_end_matches('/').to_string(),
            realm: self.realm.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            required_scopes: self.required_scopes.clone(),
            audience: self.audience.clone(),
            issuer: self.issuer.clone().unwrap_or_else(|| realm_url.clone()),
            introspection_endpoint: self
                .introspection_endpoint
                .clone()
                .unwrap_or_else(|| format!("{oidc}/token/introspect")),
            jwks_endpoint: self.jwks_endpoint.clone().unwrap_or_else(|| format!("{oidc}/certs")),
            token_endpoint: self.token_endpoint.clone().unwrap_or_else(|| format!("{oidc}/token")),
            jwks_cache_ttl: Duration::from_secs(self.jwks_cache_ttl),
            jwks_min_refresh_interval: Duration::from_secs(self.jwks_min_refresh_interval),
            clock_skew: Duration::from_secs(self.clock_skew_seconds),
            strategy: self.strategy,
            http_timeout: Duration::from_millis(self.http_timeout_ms),
            auto_refresh: self.auto_refresh.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_derives_keycloak_endpoints() {
        let oauth = AuthConfig {
            enabled: true,
            provider_url: "https://sso.example.com/".into(),
            realm: "library".into(),
            ..Default::default()
        }
        .resolve();

        assert_eq!(oauth.issuer, "https://sso.example.com/realms/library");
        assert_eq!(
            oauth.introspection_endpoint,
            "https://sso.example.com/realms/library/protocol/openid-connect/token/introspect"
        );
        assert_eq!(
            oauth.jwks_endpoint,
            "https://sso.example.com/realms/library/protocol/openid-connect/certs"
        );
        assert_eq!(
            oauth.token_endpoint,
            "https://sso.example.com/realms/library/protocol/openid-connect/token"
        );
        assert_eq!(oauth.jwks_cache_ttl, Duration::from_secs(3600));
        assert_eq!(oauth.jwks_min_refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_keeps_explicit_endpoints() {
        let oauth = AuthConfig {
            issuer: Some("https://issuer.example.com".into()),
            jwks_endpoint: Some("https://keys.example.com/jwks.json".into()),
            ..Default::default()
        }
        .resolve();

        assert_eq!(oauth.issuer, "https://issuer.example.com");
        assert_eq!(oauth.jwks_endpoint, "https://keys.example.com/jwks.json");
        assert!(oauth.token_endpoint.ends_with("/realms/solr-mcp/protocol/openid-connect/token"));
    }

    #[test]
    fn test_disabled() {
        let oauth = OAuthConfig::disabled();
        assert!(!oauth.enabled);
        assert_eq!(oauth.strategy, ValidationStrategy::Local);
    }

    #[test]
    fn test_strategy_serde() {
        let s: ValidationStrategy = serde_json::from_str("\"introspect\"").unwrap();
        assert_eq!(s, ValidationStrategy::Introspect);
        assert_eq!(ValidationStrategy::Local.to_string(), "local");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = AutoRefreshCredentials { username: "svc".into(), password: "pw-123".into() };
        assert!(!format!("{creds:?}").contains("pw-123"));
    }
}
