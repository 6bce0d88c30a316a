//! RFC 7662 token introspection against the realm

use std::time::Instant;

use serde::Deserialize;

use crate::{
    claims::{ScopeSet, TokenClaims, one_or_many},
    error::{AuthError, Result},
};

/// Introspection endpoint response
///
/// Every member is optional; a body without `active` is an inactive token.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResponse {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub scope: Option<ScopeSet>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
}

impl IntrospectionResponse {
    /// Claims for an active token; inactive tokens are rejected
    pub fn into_claims(self) -> Result<TokenClaims> {
        if !self.active {
            return Err(AuthError::TokenInactive);
        }

        Ok(TokenClaims {
            sub: self.sub.or_else(|| self.username.clone()).unwrap_or_default(),
            exp: self.exp,
            iss: self.iss,
            aud: self.aud,
            scope: self.scope.unwrap_or_default(),
            username: self.username,
        })
    }
}

/// Calls the introspection endpoint with confidential client credentials
pub struct IntrospectionClient {
    http_client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
}

impl IntrospectionClient {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Introspect one token and return the raw response
    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResponse> {
        let start = Instant::now();
        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("token", token), ("token_type_hint", "access_token")])
            .send()
            .await;
        solr_mcp_observe::metrics::record_provider_request(
            "introspect",
            start.elapsed().as_secs_f64(),
        );

        let response = response.map_err(|e| {
            AuthError::ProviderUnreachable(format!(
                "Introspection endpoint {}: {}",
                self.endpoint, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Introspection request rejected"
            );
            return Err(AuthError::rejected(&self.endpoint, status.as_u16(), &body));
        }

        response.json().await.map_err(|e| {
            AuthError::InvalidProviderResponse(format!(
                "Failed to parse introspection response: {}",
                e
            ))
        })
    }

    /// Introspect and convert to claims; `active: false` is an error
    pub async fn validate(&self, token: &str) -> Result<TokenClaims> {
        self.introspect(token).await?.into_claims()
    }
}
