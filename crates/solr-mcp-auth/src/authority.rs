//! Token validation entry point

use std::{sync::Arc, time::Instant};

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use solr_mcp_config::{OAuthConfig, ValidationStrategy};
use tracing::Instrument;

use crate::{
    bearer::{normalize_token, token_fingerprint},
    claims::{JwtClaims, TokenClaims},
    error::{AuthError, Result},
    introspection::IntrospectionClient,
    jwks_cache::{CachedJwks, JwksCache},
    token_client::{TokenClient, TokenResponse},
};

/// Validates bearer tokens for one realm
///
/// Owns the realm's [`JwksCache`]; share it behind an `Arc` rather than
/// building one per request.
pub struct TokenAuthority {
    config: OAuthConfig,
    jwks_cache: JwksCache,
    introspection: IntrospectionClient,
    token_client: TokenClient,
}

impl TokenAuthority {
    /// Build the authority and its HTTP client with finite timeouts
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let jwks_cache =
            JwksCache::new(http_client.clone(), config.jwks_endpoint.clone(), config.jwks_cache_ttl)
                .with_min_refresh_interval(config.jwks_min_refresh_interval);
        let introspection = IntrospectionClient::new(
            http_client.clone(),
            config.introspection_endpoint.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        let token_client = TokenClient::new(
            http_client,
            config.token_endpoint.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            &config.required_scopes,
            config.auto_refresh.clone(),
        );

        if config.enabled {
            tracing::info!(
                provider = %config.provider,
                issuer = %config.issuer,
                strategy = %config.strategy,
                required_scopes = ?config.required_scopes,
                "OAuth token validation enabled"
            );
        } else {
            tracing::info!("OAuth token validation disabled");
        }

        Ok(Self { config, jwks_cache, introspection, token_client })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn token_client(&self) -> &TokenClient {
        &self.token_client
    }

    /// Authenticate and authorize one call with the configured strategy
    pub async fn authorize(&self, token: Option<&str>) -> Result<TokenClaims> {
        if !self.config.enabled {
            return Ok(TokenClaims::anonymous());
        }

        let claims = self.validate(token, self.config.strategy).await?;

        if !self.check_scopes(&claims) {
            solr_mcp_observe::metrics::record_scope_denial();
            return Err(AuthError::InsufficientScopes {
                missing: claims.scope.missing(&self.config.required_scopes),
                required: self.config.required_scopes.clone(),
                actual: claims.scope.to_vec(),
            });
        }

        Ok(claims)
    }

    /// Validate a token with an explicit strategy
    ///
    /// Disabled auth yields the anonymous claim set for any input.
    pub async fn validate(
        &self,
        token: Option<&str>,
        strategy: ValidationStrategy,
    ) -> Result<TokenClaims> {
        if !self.config.enabled {
            return Ok(TokenClaims::anonymous());
        }

        let token = token.and_then(normalize_token).ok_or(AuthError::TokenMissing)?;
        let fingerprint = token_fingerprint(token);
        let span = solr_mcp_observe::logging::auth_span(strategy.as_str(), &fingerprint);
        let start = Instant::now();

        let result = async {
            match strategy {
                ValidationStrategy::Local => self.validate_local(token).await,
                ValidationStrategy::Introspect => self.introspection.validate(token).await,
            }
        }
        .instrument(span.clone())
        .await;

        let elapsed = start.elapsed();
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        solr_mcp_observe::metrics::record_token_validation(
            strategy.as_str(),
            outcome,
            elapsed.as_secs_f64(),
        );
        solr_mcp_observe::logging::record_auth_result(
            &span,
            result.as_ref().ok().map(|c| c.sub.as_str()),
            outcome,
            elapsed.as_millis(),
        );

        match &result {
            Ok(claims) => tracing::debug!(
                subject = %claims.display_name(),
                token_fingerprint = %fingerprint,
                strategy = %strategy,
                "Token validated"
            ),
            Err(e) => tracing::warn!(
                token_fingerprint = %fingerprint,
                strategy = %strategy,
                error = %e,
                "Token validation failed"
            ),
        }

        result
    }

    /// True iff the token carries every required scope; never fails
    pub fn check_scopes(&self, claims: &TokenClaims) -> bool {
        let required = &self.config.required_scopes;
        if claims.scope.satisfies(required) {
            return true;
        }

        tracing::warn!(
            subject = %claims.display_name(),
            missing = ?claims.scope.missing(required),
            required = ?required,
            actual = ?claims.scope.to_vec(),
            "Token lacks required scopes"
        );
        false
    }

    /// The realm's current key set, refreshing if absent or expired
    pub async fn fetch_jwks(&self) -> Result<Arc<CachedJwks>> {
        self.jwks_cache.get_jwks().await
    }

    /// Drop the cached key set
    pub async fn invalidate_jwks(&self) {
        self.jwks_cache.invalidate().await;
    }

    /// Password grant on a user's behalf
    pub async fn retrieve_token(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.token_client.retrieve_token(username, password).await
    }

    /// Refresh grant on a user's behalf
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token_client.refresh_token(refresh_token).await
    }

    async fn validate_local(&self, token: &str) -> Result<TokenClaims> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidTokenFormat(format!("Failed to decode header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidTokenFormat("Token header missing kid".into()))?;

        let jwk = self.jwks_cache.get_key(&kid).await?;
        let algorithm = jwk.algorithm()?;
        let decoding_key = jwk.to_decoding_key()?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.clock_skew.as_secs();
        validation.set_issuer(&[&self.config.issuer]);
        if self.config.audience.is_empty() {
            validation.validate_aud = false;
            validation.set_required_spec_claims(&["exp", "iss"]);
        } else {
            validation.set_audience(&[&self.config.audience]);
            validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        }

        let data = decode::<JwtClaims>(token, &decoding_key, &validation)?;
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use solr_mcp_config::AuthConfig;

    use super::*;

    fn enabled_config() -> OAuthConfig {
        AuthConfig {
            enabled: true,
            provider_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        }
        .resolve()
    }

    #[tokio::test]
    async fn test_disabled_returns_anonymous() {
        let authority = TokenAuthority::new(OAuthConfig::disabled()).unwrap();
        for token in [None, Some(""), Some("garbage"), Some("Bearer x.y.z")] {
            let claims = authority.validate(token, ValidationStrategy::Local).await.unwrap();
            assert!(claims.is_anonymous());
            let claims = authority.authorize(token).await.unwrap();
            assert!(claims.is_anonymous());
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_distinct() {
        let authority = TokenAuthority::new(enabled_config()).unwrap();
        for token in [None, Some(""), Some("   "), Some("Bearer ")] {
            let err = authority.authorize(token).await.unwrap_err();
            assert!(matches!(err, AuthError::TokenMissing), "{token:?} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn test_malformed_token_fails_before_network() {
        let authority = TokenAuthority::new(enabled_config()).unwrap();
        let err = authority.authorize(Some("not-a-jwt")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenFormat(_)));
    }

    #[test]
    fn test_check_scopes_logs_and_returns_false() {
        let authority = TokenAuthority::new(enabled_config()).unwrap();
        let mut claims = TokenClaims::anonymous();
        claims.scope = crate::ScopeSet::parse("solr:search");
        assert!(!authority.check_scopes(&claims));

        claims.scope = crate::ScopeSet::parse("solr:read openid solr:search");
        assert!(authority.check_scopes(&claims));
    }
}
