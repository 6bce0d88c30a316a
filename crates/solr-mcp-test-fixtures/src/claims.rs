//! Test helpers for minting Keycloak-shaped access tokens

use jsonwebtoken::{Algorithm, Header, encode};
use serde::{Deserialize, Serialize};

use crate::keys::{PRIMARY_KID, RsaTestKey};

/// Access-token claims as a Keycloak realm issues them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

impl TestClaims {
    /// Valid for an hour, audience `account`, both default scopes
    pub fn valid(issuer: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            iss: issuer.into(),
            sub: "3f1c2a9e-user-alice".to_string(),
            aud: "account".to_string(),
            exp: now + 3600,
            iat: now,
            scope: "openid profile solr:search solr:read".to_string(),
            preferred_username: Some("alice".to_string()),
            azp: Some("solr-search-server".to_string()),
        }
    }

    /// Expired an hour ago, well past any clock skew
    pub fn expired(issuer: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self { exp: now - 3600, iat: now - 7200, ..Self::valid(issuer) }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = aud.into();
        self
    }

    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = iss.into();
        self
    }
}

/// Sign claims with the primary key under [`PRIMARY_KID`]
pub fn mint_token(claims: &TestClaims) -> String {
    mint_token_with_kid(&RsaTestKey::primary(), Some(PRIMARY_KID), claims)
}

/// Sign claims with any test key and optional header `kid`
pub fn mint_token_with_kid(key: &RsaTestKey, kid: Option<&str>, claims: &TestClaims) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &key.encoding_key()).expect("fixture token encodes")
}
