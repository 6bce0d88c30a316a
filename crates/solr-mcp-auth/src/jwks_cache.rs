//! # JWKS Caching Module
//!
//! Caches the realm's JSON Web Key Set with an absolute expiry.
//!
//! - **Atomic swap**: the cached key set and its expiry live in one
//!   `Arc<CachedJwks>` replaced as a unit, so a reader never sees old keys
//!   with a new expiry.
//! - **Single refresh**: concurrent readers that find the cache expired queue
//!   on one refresh lock; the first fetches, the rest observe its result.
//! - **Key rotation**: an unknown `kid` against a cached set forces one
//!   refetch before failing, but only once that set is older than the
//!   minimum refresh interval. Tokens with made-up key ids therefore cost at
//!   most one provider call per interval.
//!
//! Network timeouts are finite; an unreachable realm fails within the
//! client timeout instead of hanging the caller.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AuthError, Result};

/// JSON Web Key as defined in RFC 7517
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for RS256)
    pub kty: String,

    /// Public key use (should be "sig" for signatures)
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    /// Key ID - unique identifier for this key
    pub kid: String,

    /// Algorithm ("RS256")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Convert JWK to jsonwebtoken DecodingKey
    pub fn to_decoding_key(&self) -> Result<DecodingKey> {
        if self.kty != "RSA" {
            return Err(AuthError::UnsupportedAlgorithm(format!(
                "Unsupported key type: {}",
                self.kty
            )));
        }

        let n = self.n.as_ref().ok_or_else(|| {
            AuthError::InvalidProviderResponse("RSA key missing 'n' parameter".into())
        })?;
        let e = self.e.as_ref().ok_or_else(|| {
            AuthError::InvalidProviderResponse("RSA key missing 'e' parameter".into())
        })?;

        DecodingKey::from_rsa_components(n, e).map_err(|e| {
            AuthError::InvalidProviderResponse(format!("Failed to create RSA decoding key: {}", e))
        })
    }

    /// Get the algorithm for this key; only RS256 is accepted
    pub fn algorithm(&self) -> Result<Algorithm> {
        match (self.kty.as_str(), self.alg.as_deref()) {
            ("RSA", Some("RS256")) | ("RSA", None) => Ok(Algorithm::RS256),
            (kty, alg) => Err(AuthError::UnsupportedAlgorithm(format!(
                "Unsupported key type/algorithm: {}/{}",
                kty,
                alg.unwrap_or("none")
            ))),
        }
    }

    /// Whether the key may verify signatures (`use` absent or `sig`)
    pub fn is_signing_key(&self) -> bool {
        self.use_.as_deref().is_none_or(|u| u == "sig")
    }
}

/// JWKS document as served by the `certs` endpoint
#[derive(Debug, Deserialize)]
pub struct JwksSet {
    /// The list of JSON Web Keys
    pub keys: Vec<Jwk>,
}

/// One fetched key set with its absolute expiry
#[derive(Debug)]
pub struct CachedJwks {
    /// The list of JSON Web Keys
    pub keys: Vec<Jwk>,
    /// Timestamp when these keys were fetched
    pub fetched_at: Instant,
    /// Served as-is while `now < expires_at`
    pub expires_at: Instant,
}

impl CachedJwks {
    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }

    /// Find a signing key by id using constant-time comparison
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .filter(|k| k.is_signing_key())
            .find(|k| k.kid.as_bytes().ct_eq(kid.as_bytes()).into())
    }
}

/// JWKS cache owned by one [`crate::TokenAuthority`]
pub struct JwksCache {
    http_client: reqwest::Client,
    endpoint: String,
    ttl: Duration,
    min_refresh_interval: Duration,
    current: RwLock<Option<Arc<CachedJwks>>>,
    /// Serializes refreshes; held only while fetching
    refresh_lock: Mutex<()>,
}

/// Default for [`JwksCache::with_min_refresh_interval`]
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

impl JwksCache {
    /// Create a cache for one JWKS endpoint
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            ttl,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// How old the cached set must be before an unknown `kid` refetches it
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The current key set, fetching if absent or expired
    pub async fn get_jwks(&self) -> Result<Arc<CachedJwks>> {
        Ok(self.load().await?.0)
    }

    /// Find the signing key for `kid`, refetching once on a miss
    pub async fn get_key(&self, kid: &str) -> Result<Jwk> {
        let (jwks, fresh) = self.load().await?;
        if let Some(key) = jwks.find(kid) {
            return Ok(key.clone());
        }

        if !fresh {
            if jwks.fetched_at.elapsed() >= self.min_refresh_interval {
                tracing::info!(kid = %kid, "Key id not in cached JWKS, refetching for rotation");
                let jwks = self.refresh_replacing(&jwks).await?;
                if let Some(key) = jwks.find(kid) {
                    return Ok(key.clone());
                }
            } else {
                tracing::debug!(
                    kid = %kid,
                    age_ms = jwks.fetched_at.elapsed().as_millis(),
                    "Key id not in cached JWKS; set too recent to refetch"
                );
            }
        }

        tracing::warn!(kid = %kid, endpoint = %self.endpoint, "No JWKS key matches token kid");
        Err(AuthError::KeyNotFound { kid: kid.to_string() })
    }

    /// Drop the cached key set; the next read refetches
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }

    async fn current_if_valid(&self) -> Option<Arc<CachedJwks>> {
        self.current.read().await.as_ref().filter(|c| c.is_valid()).cloned()
    }

    /// Returns the key set and whether it was fetched by this call's refresh
    async fn load(&self) -> Result<(Arc<CachedJwks>, bool)> {
        if let Some(cached) = self.current_if_valid().await {
            tracing::debug!("JWKS cache hit");
            solr_mcp_observe::metrics::record_jwks_cache_hit();
            return Ok((cached, false));
        }

        solr_mcp_observe::metrics::record_jwks_cache_miss();
        let _guard = self.refresh_lock.lock().await;

        // A concurrent refresh may have finished while we waited
        if let Some(cached) = self.current_if_valid().await {
            return Ok((cached, true));
        }

        Ok((self.fetch_and_store().await?, true))
    }

    async fn refresh_replacing(&self, stale: &Arc<CachedJwks>) -> Result<Arc<CachedJwks>> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.current_if_valid().await
            && !Arc::ptr_eq(&current, stale)
        {
            return Ok(current);
        }

        self.fetch_and_store().await
    }

    async fn fetch_and_store(&self) -> Result<Arc<CachedJwks>> {
        let start = Instant::now();
        let result = self.fetch().await;
        let elapsed = start.elapsed().as_secs_f64();
        solr_mcp_observe::metrics::record_jwks_refresh(elapsed, result.is_ok());
        solr_mcp_observe::metrics::record_provider_request("jwks", elapsed);

        let keys = result.inspect_err(|e| {
            tracing::error!(endpoint = %self.endpoint, error = %e, "JWKS fetch failed");
        })?;

        let fetched_at = Instant::now();
        let cached = Arc::new(CachedJwks { keys, fetched_at, expires_at: fetched_at + self.ttl });
        *self.current.write().await = Some(cached.clone());

        tracing::info!(
            endpoint = %self.endpoint,
            key_count = cached.keys.len(),
            ttl_secs = self.ttl.as_secs(),
            "JWKS refreshed"
        );

        Ok(cached)
    }

    async fn fetch(&self) -> Result<Vec<Jwk>> {
        let response = self.http_client.get(&self.endpoint).send().await.map_err(|e| {
            AuthError::ProviderUnreachable(format!("JWKS endpoint {}: {}", self.endpoint, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::rejected(&self.endpoint, status.as_u16(), &body));
        }

        let jwks: JwksSet = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidProviderResponse(format!("Failed to parse JWKS: {}", e)))?;

        if jwks.keys.is_empty() {
            return Err(AuthError::InvalidProviderResponse("JWKS contains no keys".to_string()));
        }

        Ok(jwks.keys)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rsa_jwk(kid: &str) -> Jwk {
        serde_json::from_value(json!({
            "kty": "RSA", "kid": kid, "alg": "RS256", "use": "sig",
            "n": "sXch", "e": "AQAB"
        }))
        .unwrap()
    }

    #[test]
    fn test_jwk_algorithm() {
        assert_eq!(rsa_jwk("k1").algorithm().unwrap(), Algorithm::RS256);

        let mut ec = rsa_jwk("k2");
        ec.kty = "EC".into();
        ec.alg = Some("ES256".into());
        assert!(matches!(ec.algorithm(), Err(AuthError::UnsupportedAlgorithm(_))));
        assert!(matches!(ec.to_decoding_key(), Err(AuthError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_jwk_missing_modulus() {
        let mut jwk = rsa_jwk("k1");
        jwk.n = None;
        assert!(matches!(jwk.to_decoding_key(), Err(AuthError::InvalidProviderResponse(_))));
    }

    #[test]
    fn test_find_skips_encryption_keys() {
        let mut enc = rsa_jwk("k-enc");
        enc.use_ = Some("enc".into());
        let now = Instant::now();
        let cached = CachedJwks {
            keys: vec![enc, rsa_jwk("k-sig")],
            fetched_at: now,
            expires_at: now + Duration::from_secs(60),
        };
        assert!(cached.find("k-enc").is_none());
        assert!(cached.find("k-sig").is_some());
        assert!(cached.find("k-si").is_none());
        assert!(cached.is_valid());
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let now = Instant::now();
        let cached = CachedJwks { keys: vec![], fetched_at: now, expires_at: now };
        assert!(!cached.is_valid());
    }
}
