mod common;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use solr_mcp_auth::{AuthError, AuthErrorKind, ValidationStrategy};
use solr_mcp_test_fixtures::{
    MockKeycloak, PRIMARY_KID, RsaTestKey, TestClaims, mint_token, mint_token_with_kid,
};

#[tokio::test]
async fn test_valid_token_yields_claims() {
    common::init_tracing();
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token = mint_token(&TestClaims::valid(keycloak.issuer()));
    let claims = authority.authorize(Some(&token)).await.expect("token accepted");

    assert_eq!(claims.sub, "3f1c2a9e-user-alice");
    assert_eq!(claims.username.as_deref(), Some("alice"));
    assert_eq!(claims.iss.as_deref(), Some(keycloak.issuer().as_str()));
    assert!(claims.scope.contains("solr:search"));
    assert!(claims.expires_at().is_some());
}

#[tokio::test]
async fn test_bearer_prefix_is_accepted() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token = mint_token(&TestClaims::valid(keycloak.issuer()));
    let header = format!("Bearer {token}");
    assert!(authority.authorize(Some(&header)).await.is_ok());
}

#[tokio::test]
async fn test_expired_token_is_distinguishable() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token = mint_token(&TestClaims::expired(keycloak.issuer()));
    let err = authority.validate(Some(&token), ValidationStrategy::Local).await.unwrap_err();

    assert!(matches!(err, AuthError::TokenExpired));
    assert_eq!(err.kind(), AuthErrorKind::TokenExpired);
}

#[tokio::test]
async fn test_signature_from_other_key_is_invalid() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    // Same kid as the published key, signed by a key the realm never published
    let token = mint_token_with_kid(
        &RsaTestKey::rogue(),
        Some(PRIMARY_KID),
        &TestClaims::valid(keycloak.issuer()),
    );
    let err = authority.authorize(Some(&token)).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidSignature));
    assert_eq!(err.kind(), AuthErrorKind::TokenInvalid);
}

#[tokio::test]
async fn test_wrong_issuer_is_invalid() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let claims = TestClaims::valid(keycloak.issuer()).with_issuer("http://evil.example/realms/x");
    let err = authority.authorize(Some(&mint_token(&claims))).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidIssuer(_)));
    assert_eq!(err.kind(), AuthErrorKind::TokenInvalid);
}

#[tokio::test]
async fn test_wrong_audience_is_invalid() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let claims = TestClaims::valid(keycloak.issuer()).with_audience("some-other-client");
    let err = authority.authorize(Some(&mint_token(&claims))).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidAudience(_)));
}

#[tokio::test]
async fn test_symmetric_algorithm_is_rejected() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(PRIMARY_KID.to_string());
    let token = encode(
        &header,
        &TestClaims::valid(keycloak.issuer()),
        &EncodingKey::from_secret(b"shared-secret"),
    )
    .unwrap();

    let err = authority.authorize(Some(&token)).await.unwrap_err();
    assert!(matches!(err, AuthError::UnsupportedAlgorithm(_)));
    assert_eq!(keycloak.jwks_hits(), 0);
}

#[tokio::test]
async fn test_missing_kid_is_invalid() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let token =
        mint_token_with_kid(&RsaTestKey::primary(), None, &TestClaims::valid(keycloak.issuer()));
    let err = authority.authorize(Some(&token)).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidTokenFormat(_)));
}

#[tokio::test]
async fn test_insufficient_scopes_is_third_outcome() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let claims = TestClaims::valid(keycloak.issuer()).with_scope("openid solr:search");
    let token = mint_token(&claims);

    // Validation alone succeeds; authorization does not
    let validated = authority.validate(Some(&token), ValidationStrategy::Local).await.unwrap();
    assert!(!authority.check_scopes(&validated));

    match authority.authorize(Some(&token)).await.unwrap_err() {
        AuthError::InsufficientScopes { missing, required, actual } => {
            assert_eq!(missing, vec!["solr:read".to_string()]);
            assert_eq!(required, vec!["solr:search".to_string(), "solr:read".to_string()]);
            assert!(actual.contains(&"solr:search".to_string()));
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_token_never_contacts_provider() {
    let keycloak = MockKeycloak::start().await;
    let authority = common::authority(&keycloak);

    let err = authority.authorize(None).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenMissing));
    assert_eq!(keycloak.jwks_hits(), 0);
    assert_eq!(keycloak.introspect_hits(), 0);
}

#[tokio::test]
async fn test_unreachable_provider_is_not_valid() {
    let authority = common::unreachable_authority();

    let token = mint_token(&TestClaims::valid("http://127.0.0.1:9/realms/solr-mcp"));
    let err = authority.authorize(Some(&token)).await.unwrap_err();

    assert!(matches!(err, AuthError::ProviderUnreachable(_)), "got {err:?}");
    assert_eq!(err.kind(), AuthErrorKind::ProviderUnreachable);
}
