//! Token endpoint client: password and refresh grants
//!
//! Used by integrations that act as a service account rather than
//! forwarding a caller's token. [`TokenClient::service_token`] keeps one
//! access token warm, refreshing it shortly before expiry and falling back to
//! the password grant when the refresh token is rejected.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result};
use solr_mcp_config::AutoRefreshCredentials;

/// Refresh this long before the access token expires
const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

struct ServiceToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<Instant>,
}

impl ServiceToken {
    fn from_response(response: TokenResponse) -> Self {
        let expires_at =
            response.expires_in.map(|secs| Instant::now() + Duration::from_secs(secs));
        Self { access_token: response.access_token, refresh_token: response.refresh_token, expires_at }
    }

    fn is_fresh(&self) -> bool {
        self.expires_at.is_none_or(|at| Instant::now() + REFRESH_MARGIN < at)
    }
}

/// Client for the realm's token endpoint
pub struct TokenClient {
    http_client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
    scope: String,
    service_account: Option<AutoRefreshCredentials>,
    service_token: Mutex<Option<ServiceToken>>,
}

impl TokenClient {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        required_scopes: &[String],
        service_account: Option<AutoRefreshCredentials>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: required_scopes.join(" "),
            service_account,
            service_token: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resource-owner password grant
    pub async fn retrieve_token(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", username),
            ("password", password),
        ];
        if !self.scope.is_empty() {
            form.push(("scope", self.scope.as_str()));
        }
        if !self.client_secret.is_empty() {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        tracing::debug!(username = %username, "Requesting token with password grant");
        self.request("password", &form).await
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if !self.client_secret.is_empty() {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        tracing::debug!("Refreshing access token");
        self.request("refresh_token", &form).await
    }

    /// A current access token for the configured service account
    pub async fn service_token(&self) -> Result<String> {
        let credentials = self.service_account.as_ref().ok_or_else(|| {
            AuthError::Configuration("no auto-refresh service account configured".into())
        })?;

        let mut slot = self.service_token.lock().await;

        if let Some(token) = slot.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }

        let refreshed = match slot.as_ref().and_then(|t| t.refresh_token.clone()) {
            Some(refresh) => match self.refresh_token(&refresh).await {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::info!(error = %e, "Refresh grant failed, falling back to password grant");
                    None
                },
            },
            None => None,
        };

        let response = match refreshed {
            Some(response) => response,
            None => self.retrieve_token(&credentials.username, &credentials.password).await?,
        };

        let token = ServiceToken::from_response(response);
        let access_token = token.access_token.clone();
        *slot = Some(token);
        Ok(access_token)
    }

    async fn request(&self, grant_type: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let start = Instant::now();
        let result = self.send(form).await;
        solr_mcp_observe::metrics::record_provider_request("token", start.elapsed().as_secs_f64());
        solr_mcp_observe::metrics::record_token_request(grant_type, result.is_ok());

        if let Err(e) = &result {
            tracing::warn!(grant_type = %grant_type, error = %e, "Token request failed");
        }
        result
    }

    async fn send(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response =
            self.http_client.post(&self.endpoint).form(form).send().await.map_err(|e| {
                AuthError::ProviderUnreachable(format!("Token endpoint {}: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::rejected(&self.endpoint, status.as_u16(), &body));
        }

        response.json().await.map_err(|e| {
            AuthError::InvalidProviderResponse(format!("Failed to parse token response: {}", e))
        })
    }
}
