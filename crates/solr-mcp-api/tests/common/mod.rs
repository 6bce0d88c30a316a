//! Shared helpers for dispatcher and REST tests

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use serde_json::Value;
use solr_mcp_api::ToolDispatcher;
use solr_mcp_auth::{OAuthConfig, TokenAuthority};
use solr_mcp_config::{AuthConfig, SolrConfig};
use solr_mcp_search::{EngineQueryError, SearchBackend, SearchError, SolrGateway};
use solr_mcp_test_fixtures::{
    MockKeycloak, MockSolr, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REALM, TestClaims, mint_token,
};
use solr_mcp_types::{Document, DocumentLookup, SearchRequest, SearchResult, ToolResponse};
use tower::ServiceExt;

pub const SERVER_NAME: &str = "Solr Search Test";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn solr_config(solr: &MockSolr) -> SolrConfig {
    SolrConfig {
        base_url: solr.base_url().to_string(),
        collection: solr.collection().to_string(),
        connect_timeout_ms: 1_000,
        request_timeout_ms: 2_000,
        ..Default::default()
    }
}

pub fn gateway(solr: &MockSolr) -> Arc<dyn SearchBackend> {
    Arc::new(SolrGateway::new(&solr_config(solr)).expect("gateway builds"))
}

/// Gateway pointed at a closed local port
pub fn unreachable_gateway() -> Arc<dyn SearchBackend> {
    let config = SolrConfig {
        base_url: "http://127.0.0.1:9/solr".to_string(),
        connect_timeout_ms: 500,
        request_timeout_ms: 500,
        ..Default::default()
    };
    Arc::new(SolrGateway::new(&config).expect("gateway builds"))
}

pub fn secured_auth(keycloak: &MockKeycloak) -> OAuthConfig {
    AuthConfig {
        enabled: true,
        provider_url: keycloak.base_url().to_string(),
        realm: TEST_REALM.to_string(),
        client_id: TEST_CLIENT_ID.to_string(),
        client_secret: TEST_CLIENT_SECRET.to_string(),
        http_timeout_ms: 2_000,
        ..Default::default()
    }
    .resolve()
}

pub fn dispatcher(auth: OAuthConfig, backend: Arc<dyn SearchBackend>) -> Arc<ToolDispatcher> {
    let authority = Arc::new(TokenAuthority::new(auth).expect("authority builds"));
    Arc::new(ToolDispatcher::new(SERVER_NAME, authority, backend))
}

/// Auth disabled, real gateway against the mock collection
pub fn open_dispatcher(solr: &MockSolr) -> Arc<ToolDispatcher> {
    dispatcher(OAuthConfig::disabled(), gateway(solr))
}

/// Auth enabled against the mock realm, real gateway against the mock collection
pub fn secured_dispatcher(solr: &MockSolr, keycloak: &MockKeycloak) -> Arc<ToolDispatcher> {
    dispatcher(secured_auth(keycloak), gateway(solr))
}

pub fn valid_token(keycloak: &MockKeycloak) -> String {
    mint_token(&TestClaims::valid(keycloak.issuer()))
}

pub fn token_with_scope(keycloak: &MockKeycloak, scope: &str) -> String {
    mint_token(&TestClaims::valid(keycloak.issuer()).with_scope(scope))
}

pub fn expired_token(keycloak: &MockKeycloak) -> String {
    mint_token(&TestClaims::expired(keycloak.issuer()))
}

/// Backend that counts calls and answers with empty results
#[derive(Default)]
pub struct CountingBackend {
    calls: AtomicUsize,
}

impl CountingBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for CountingBackend {
    fn collection(&self) -> &str {
        "stub"
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ToolResponse<SearchResult>, EngineQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResponse::Ok(SearchResult {
            status: 0,
            num_found: 0,
            start: u64::from(request.start()),
            docs: Vec::new(),
            facet_counts: None,
            highlighting: None,
        }))
    }

    async fn get_document(
        &self,
        lookup: &DocumentLookup,
    ) -> Result<ToolResponse<Document>, EngineQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut doc = Document::new();
        doc.insert("id".to_string(), Value::String(lookup.id().to_string()));
        Ok(ToolResponse::Ok(doc))
    }

    async fn ping(&self) -> solr_mcp_search::Result<()> {
        Err(SearchError::EngineUnreachable("stub has no engine".to_string()))
    }
}

/// Send one request through the router and decode the JSON body
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };
    (status, headers, body)
}

pub fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub fn post_json_with_token(path: &str, token: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).expect("request builds")
}

/// First value sent for `key` in the most recent engine request
pub fn solr_param(solr: &MockSolr, key: &str) -> Option<String> {
    solr.last_params().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}
