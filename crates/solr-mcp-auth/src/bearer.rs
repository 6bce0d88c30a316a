//! Bearer token extraction and log-safe fingerprints

use sha2::{Digest, Sha256};

/// Extract the token from an `Authorization: Bearer <token>` value
///
/// The scheme is matched case-insensitively. Any other scheme, or an empty
/// token, yields `None`.
///
/// ```
/// use solr_mcp_auth::extract_bearer;
///
/// assert_eq!(extract_bearer("Bearer eyJ0eXAi"), Some("eyJ0eXAi"));
/// assert_eq!(extract_bearer("bearer   abc "), Some("abc"));
/// assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
/// ```
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Accept either a raw token or `Bearer <token>`; blank is `None`
pub fn normalize_token(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("bearer") {
        return None;
    }
    match raw.split_once(' ') {
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("bearer") => extract_bearer(raw),
        _ => Some(raw),
    }
}

/// First 12 hex characters of the token's SHA-256
///
/// Identifies a token in logs without revealing it.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}
