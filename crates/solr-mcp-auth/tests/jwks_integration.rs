mod common;

use std::{sync::Arc, time::Duration};

use serde_json::json;
use solr_mcp_auth::AuthError;
use solr_mcp_test_fixtures::{
    MockKeycloak, PRIMARY_KID, RsaTestKey, TestClaims, mint_token, mint_token_with_kid,
};

#[tokio::test]
async fn test_jwks_fetched_once_per_window() {
    common::init_tracing();
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token = mint_token(&TestClaims::valid(keycloak.issuer()));
    for _ in 0..5 {
        authority.authorize(Some(&token)).await.expect("token accepted");
    }

    assert_eq!(keycloak.jwks_hits(), 1);
}

#[tokio::test]
async fn test_expiry_triggers_exactly_one_refetch() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority_with_ttl(&keycloak, Duration::from_millis(200));

    let token = mint_token(&TestClaims::valid(keycloak.issuer()));
    authority.authorize(Some(&token)).await.unwrap();
    authority.authorize(Some(&token)).await.unwrap();
    assert_eq!(keycloak.jwks_hits(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;

    authority.authorize(Some(&token)).await.unwrap();
    authority.authorize(Some(&token)).await.unwrap();
    assert_eq!(keycloak.jwks_hits(), 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let keycloak = MockKeycloak::start().await;
    keycloak.set_jwks_delay(Duration::from_millis(150));
    let authority = Arc::new(common::authority(&keycloak));

    let token = mint_token(&TestClaims::valid(keycloak.issuer()));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let authority = authority.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move { authority.authorize(Some(&token)).await }));
    }
    for handle in handles {
        handle.await.unwrap().expect("token accepted");
    }

    assert_eq!(keycloak.jwks_hits(), 1);
}

#[tokio::test]
async fn test_fetch_jwks_returns_published_keys() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let jwks = authority.fetch_jwks().await.unwrap();
    assert_eq!(jwks.keys.len(), 1);
    assert_eq!(jwks.keys[0].kid, PRIMARY_KID);
    assert_eq!(jwks.keys[0].kty, "RSA");
    assert!(jwks.expires_at > jwks.fetched_at);
}

#[tokio::test]
async fn test_unknown_kid_refetches_for_rotation() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority_with_min_refresh(&keycloak, Duration::ZERO);

    // Warm the cache with the original key set
    authority.fetch_jwks().await.unwrap();
    assert_eq!(keycloak.jwks_hits(), 1);

    // Realm rotates to a new key
    let rotated = RsaTestKey::rogue();
    keycloak.set_jwks(rotated.jwks("rotated-key"));

    let token =
        mint_token_with_kid(&rotated, Some("rotated-key"), &TestClaims::valid(keycloak.issuer()));
    authority.authorize(Some(&token)).await.expect("rotated key accepted");
    assert_eq!(keycloak.jwks_hits(), 2);
}

#[tokio::test]
async fn test_unknown_kid_fails_after_single_refetch() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority_with_min_refresh(&keycloak, Duration::ZERO);
    authority.fetch_jwks().await.unwrap();

    let token = mint_token_with_kid(
        &RsaTestKey::primary(),
        Some("never-published"),
        &TestClaims::valid(keycloak.issuer()),
    );
    let err = authority.authorize(Some(&token)).await.unwrap_err();

    assert!(matches!(err, AuthError::KeyNotFound { ref kid } if kid == "never-published"));
    assert_eq!(keycloak.jwks_hits(), 2);
}

#[tokio::test]
async fn test_unknown_kids_within_refresh_interval_do_not_refetch() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);
    authority.fetch_jwks().await.unwrap();

    for i in 0..5 {
        let kid = format!("forged-{i}");
        let token = mint_token_with_kid(
            &RsaTestKey::primary(),
            Some(&kid),
            &TestClaims::valid(keycloak.issuer()),
        );
        let err = authority.authorize(Some(&token)).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound { .. }));
    }

    assert_eq!(keycloak.jwks_hits(), 1);
}

#[tokio::test]
async fn test_rotation_refetch_allowed_once_interval_elapses() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority_with_min_refresh(&keycloak, Duration::from_millis(200));
    authority.fetch_jwks().await.unwrap();

    let rotated = RsaTestKey::rogue();
    keycloak.set_jwks(rotated.jwks("rotated-key"));
    let token =
        mint_token_with_kid(&rotated, Some("rotated-key"), &TestClaims::valid(keycloak.issuer()));

    let err = authority.authorize(Some(&token)).await.unwrap_err();
    assert!(matches!(err, AuthError::KeyNotFound { .. }));
    assert_eq!(keycloak.jwks_hits(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;

    authority.authorize(Some(&token)).await.expect("rotated key accepted");
    authority.authorize(Some(&token)).await.expect("rotated key cached");
    assert_eq!(keycloak.jwks_hits(), 2);
}

#[tokio::test]
async fn test_unknown_kid_on_fresh_fetch_does_not_refetch() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token = mint_token_with_kid(
        &RsaTestKey::primary(),
        Some("never-published"),
        &TestClaims::valid(keycloak.issuer()),
    );
    let err = authority.authorize(Some(&token)).await.unwrap_err();

    assert!(matches!(err, AuthError::KeyNotFound { .. }));
    assert_eq!(keycloak.jwks_hits(), 1);
}

#[tokio::test]
async fn test_empty_key_set_is_invalid_response() {
    let keycloak = MockKeycloak::start().await;
    keycloak.set_jwks(json!({"keys": []}));
    let authority = common::authority(&keycloak);

    let err = authority.fetch_jwks().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidProviderResponse(_)));
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    authority.fetch_jwks().await.unwrap();
    authority.invalidate_jwks().await;
    authority.fetch_jwks().await.unwrap();

    assert_eq!(keycloak.jwks_hits(), 2);
}
