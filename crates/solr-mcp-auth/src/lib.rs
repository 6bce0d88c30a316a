//! # Solr MCP Auth - Bearer Token Validation
//!
//! Decides, for one bearer token, whether it is authentic, unexpired, issued
//! by the configured realm, and carries every required scope.
//!
//! ## Strategies
//!
//! - **Local**: verify the RS256 signature against the realm's cached JWKS and
//!   check issuer, audience and expiry offline.
//! - **Introspect**: ask the realm's introspection endpoint (RFC 7662); the
//!   `active` flag is authoritative and catches server-side revocation.
//!
//! With auth disabled every call yields the anonymous claim set, which
//! satisfies every scope requirement.
//!
//! ## Example
//!
//! ```no_run
//! use solr_mcp_auth::TokenAuthority;
//! use solr_mcp_config::AuthConfig;
//!
//! # async fn example() -> Result<(), solr_mcp_auth::AuthError> {
//! let config = AuthConfig { enabled: true, ..Default::default() }.resolve();
//! let authority = TokenAuthority::new(config)?;
//!
//! let claims = authority.authorize(Some("eyJhbGciOi...")).await?;
//! println!("authorized {}", claims.sub);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod authority;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod introspection;
pub mod jwks_cache;
pub mod token_client;

pub use authority::TokenAuthority;
pub use bearer::{extract_bearer, normalize_token, token_fingerprint};
pub use claims::{ScopeSet, TokenClaims};
pub use error::{AuthError, AuthErrorKind, Result};
pub use introspection::{IntrospectionClient, IntrospectionResponse};
pub use jwks_cache::{CachedJwks, Jwk, JwksCache};
pub use solr_mcp_config::{OAuthConfig, ValidationStrategy};
pub use token_client::{TokenClient, TokenResponse};
