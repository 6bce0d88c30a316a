//! Shared helpers for auth integration tests

#![allow(dead_code)]

use std::time::Duration;

use solr_mcp_auth::{OAuthConfig, TokenAuthority, ValidationStrategy};
use solr_mcp_config::{AuthConfig, AutoRefreshCredentials};
use solr_mcp_test_fixtures::{MockKeycloak, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REALM};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Auth config pointed at a running mock realm
pub fn auth_config(keycloak: &MockKeycloak) -> AuthConfig {
    AuthConfig {
        enabled: true,
        provider_url: keycloak.base_url().to_string(),
        realm: TEST_REALM.to_string(),
        client_id: TEST_CLIENT_ID.to_string(),
        client_secret: TEST_CLIENT_SECRET.to_string(),
        http_timeout_ms: 2_000,
        ..Default::default()
    }
}

pub fn oauth_config(keycloak: &MockKeycloak) -> OAuthConfig {
    auth_config(keycloak).resolve()
}

pub fn authority(keycloak: &MockKeycloak) -> TokenAuthority {
    TokenAuthority::new(oauth_config(keycloak)).expect("authority builds")
}

pub fn authority_with_ttl(keycloak: &MockKeycloak, ttl: Duration) -> TokenAuthority {
    let mut config = oauth_config(keycloak);
    config.jwks_cache_ttl = ttl;
    TokenAuthority::new(config).expect("authority builds")
}

/// Authority that may refetch the JWKS for an unknown `kid` once the set is `interval` old
pub fn authority_with_min_refresh(keycloak: &MockKeycloak, interval: Duration) -> TokenAuthority {
    let mut config = oauth_config(keycloak);
    config.jwks_min_refresh_interval = interval;
    TokenAuthority::new(config).expect("authority builds")
}

pub fn introspecting_authority(keycloak: &MockKeycloak) -> TokenAuthority {
    let mut config = oauth_config(keycloak);
    config.strategy = ValidationStrategy::Introspect;
    TokenAuthority::new(config).expect("authority builds")
}

pub fn service_account_authority(
    keycloak: &MockKeycloak,
    username: &str,
    password: &str,
) -> TokenAuthority {
    let mut config = oauth_config(keycloak);
    config.auto_refresh = Some(AutoRefreshCredentials {
        username: username.to_string(),
        password: password.to_string(),
    });
    TokenAuthority::new(config).expect("authority builds")
}

/// Authority whose provider URL points at a closed local port
pub fn unreachable_authority() -> TokenAuthority {
    let config = AuthConfig {
        enabled: true,
        provider_url: "http://127.0.0.1:9".to_string(),
        http_timeout_ms: 500,
        ..Default::default()
    };
    TokenAuthority::new(config.resolve()).expect("authority builds")
}
