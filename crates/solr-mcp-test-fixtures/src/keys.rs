//! Fixed RSA key pairs for RS256 token tests
//!
//! `primary` is the realm's published signing key. `rogue` is an unrelated key
//! used to produce well-formed tokens with invalid signatures.

use jsonwebtoken::EncodingKey;
use serde_json::{Value, json};

/// Key id the mock realm publishes for the primary key
pub const PRIMARY_KID: &str = "test-key-primary";

/// Public exponent shared by both keys (65537)
pub const TEST_E: &str = "AQAB";

const PRIMARY_PEM: &str = include_str!("../keys/primary.pem");
const PRIMARY_N: &str = "yQ6iQ2-0tlXHNR5oueQwG7VrmHDqoQMrFiHN5u1UsJYTmVRjY1-qHx8Axl4ibP7hSuzC3ilu9KxTtuDDNtucwdu5jCAA38_0vfv88l4HROHDhjRvp1hNGtdweMmibN09-9dj-M8TMP8WM5IeMTDVTZAO53IWPGBiwJht0PXlVugb9swOK1s3In9I-lJ4J_dgHZX34J-exbTrS6Uwx6LKKRKyCgRU9hklKR0w1-irAe0rbAJFnLlRJmVTz-lcdJo40Mc2mZVzvgWaFXEmOooS_7dmNztxou2Ch6SVcAiLCWdjSvFT8Cg-oT_7YPBldynyicGJdGek2dVA5tV4jgbAfw";

const ROGUE_PEM: &str = include_str!("../keys/rogue.pem");
const ROGUE_N: &str = "pf3REV6CNfMwgveGyW2eBNdvxWg_wqEfpxDTUqYJaaKXTG9c41CAeCYWu6Zjj-XFl1W_lnH0KJyjkHqGGUqhSo8Bao7tcdxqCf0uAVXEef0hV0wizwtBVC_gsXu0PWPg0c6xAp5q2-2IV7zEko6hfRWNiQtszDA2lhvB9j1RUOT2H7W-gn4KJppJBYvX-lBGcMhoHpnN8-kgtVHu-IQpwrRfRrJ3GZqpfYDYji22npNmpS9BmWynsu_V5IGA6c9JjWpWRAVLVVNmYAgXQKk9MuEo84_H_hDVU0jQh7WfuE7x9wEeAIb67-VxBYOeqvkD4oBXv_0H14JlK7o2NLb4QQ";

/// An RSA test key: PKCS#1 private PEM plus public JWK components
#[derive(Debug, Clone, Copy)]
pub struct RsaTestKey {
    pub pem: &'static str,
    pub n: &'static str,
    pub e: &'static str,
}

impl RsaTestKey {
    /// The key the mock realm publishes by default
    pub fn primary() -> Self {
        Self { pem: PRIMARY_PEM, n: PRIMARY_N, e: TEST_E }
    }

    /// A key nobody publishes
    pub fn rogue() -> Self {
        Self { pem: ROGUE_PEM, n: ROGUE_N, e: TEST_E }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_rsa_pem(self.pem.as_bytes()).expect("fixture PEM is valid")
    }

    /// Public JWK in the shape Keycloak's `certs` endpoint returns
    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kid": kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": self.n,
            "e": self.e,
        })
    }

    /// A one-key JWKS document
    pub fn jwks(&self, kid: &str) -> Value {
        json!({ "keys": [self.jwk(kid)] })
    }
}
