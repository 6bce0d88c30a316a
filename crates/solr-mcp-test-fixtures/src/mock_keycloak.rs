//! In-process mock of one Keycloak realm
//!
//! Serves the three OpenID Connect endpoints the gateway uses and counts
//! every request so tests can assert on caching behavior.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::keys::{PRIMARY_KID, RsaTestKey};

pub const TEST_REALM: &str = "solr-mcp";
pub const TEST_CLIENT_ID: &str = "solr-search-server";
pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

struct RealmState {
    jwks: Mutex<Value>,
    introspection: Mutex<HashMap<String, Value>>,
    users: Mutex<HashMap<String, String>>,
    refresh_tokens: Mutex<HashSet<String>>,
    last_token_form: Mutex<Option<HashMap<String, String>>>,
    access_ttl: AtomicI64,
    jwks_delay_ms: AtomicU64,
    issued: AtomicUsize,
    jwks_hits: AtomicUsize,
    introspect_hits: AtomicUsize,
    token_hits: AtomicUsize,
}

/// A running mock realm; the server stops when this is dropped
pub struct MockKeycloak {
    base_url: String,
    state: Arc<RealmState>,
    handle: JoinHandle<()>,
}

impl MockKeycloak {
    /// Start on a random local port publishing the primary test key
    pub async fn start() -> Self {
        let state = Arc::new(RealmState {
            jwks: Mutex::new(RsaTestKey::primary().jwks(PRIMARY_KID)),
            introspection: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashSet::new()),
            last_token_form: Mutex::new(None),
            access_ttl: AtomicI64::new(300),
            jwks_delay_ms: AtomicU64::new(0),
            issued: AtomicUsize::new(0),
            jwks_hits: AtomicUsize::new(0),
            introspect_hits: AtomicUsize::new(0),
            token_hits: AtomicUsize::new(0),
        });

        let oidc = format!("/realms/{TEST_REALM}/protocol/openid-connect");
        let app = Router::new()
            .route(&format!("{oidc}/certs"), get(certs_handler))
            .route(&format!("{oidc}/token/introspect"), post(introspect_handler))
            .route(&format!("{oidc}/token"), post(token_handler))
            .with_state(state.clone());

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state, handle }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/realms/{realm}`, the issuer Keycloak stamps on tokens
    pub fn issuer(&self) -> String {
        format!("{}/realms/{}", self.base_url, TEST_REALM)
    }

    /// Replace the published key set
    pub fn set_jwks(&self, jwks: Value) {
        *self.state.jwks.lock().unwrap() = jwks;
    }

    /// Delay every JWKS response
    pub fn set_jwks_delay(&self, delay: Duration) {
        self.state.jwks_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Introspection answer for one token; unknown tokens are inactive
    pub fn set_introspection(&self, token: &str, response: Value) {
        self.state.introspection.lock().unwrap().insert(token.to_string(), response);
    }

    /// Register a user for the password grant
    pub fn add_user(&self, username: &str, password: &str) {
        self.state.users.lock().unwrap().insert(username.to_string(), password.to_string());
    }

    /// `expires_in` for issued access tokens
    pub fn set_access_ttl(&self, seconds: i64) {
        self.state.access_ttl.store(seconds, Ordering::SeqCst);
    }

    /// Forget every issued refresh token
    pub fn revoke_refresh_tokens(&self) {
        self.state.refresh_tokens.lock().unwrap().clear();
    }

    pub fn jwks_hits(&self) -> usize {
        self.state.jwks_hits.load(Ordering::SeqCst)
    }

    pub fn introspect_hits(&self) -> usize {
        self.state.introspect_hits.load(Ordering::SeqCst)
    }

    pub fn token_hits(&self) -> usize {
        self.state.token_hits.load(Ordering::SeqCst)
    }

    /// Form fields of the most recent token endpoint request
    pub fn last_token_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_token_form.lock().unwrap().clone()
    }
}

impl Drop for MockKeycloak {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn certs_handler(State(state): State<Arc<RealmState>>) -> Json<Value> {
    state.jwks_hits.fetch_add(1, Ordering::SeqCst);

    let delay = state.jwks_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    Json(state.jwks.lock().unwrap().clone())
}

async fn introspect_handler(
    State(state): State<Arc<RealmState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.introspect_hits.fetch_add(1, Ordering::SeqCst);

    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD
            .encode(format!("{TEST_CLIENT_ID}:{TEST_CLIENT_SECRET}"))
    );
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized_client", "error_description": "Invalid client credentials"})),
        )
            .into_response();
    }

    let token = form.get("token").cloned().unwrap_or_default();
    let body = state
        .introspection
        .lock()
        .unwrap()
        .get(&token)
        .cloned()
        .unwrap_or_else(|| json!({"active": false}));

    Json(body).into_response()
}

async fn token_handler(
    State(state): State<Arc<RealmState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock().unwrap() = Some(form.clone());

    let client_ok = form.get("client_id").map(String::as_str) == Some(TEST_CLIENT_ID)
        && form.get("client_secret").map(String::as_str) == Some(TEST_CLIENT_SECRET);
    if !client_ok {
        return oauth_error(StatusCode::UNAUTHORIZED, "unauthorized_client", "Invalid client credentials");
    }

    match form.get("grant_type").map(String::as_str) {
        Some("password") => {
            let username = form.get("username").cloned().unwrap_or_default();
            let password = form.get("password").cloned().unwrap_or_default();
            let known = state.users.lock().unwrap().get(&username) == Some(&password);
            if !known {
                return oauth_error(StatusCode::UNAUTHORIZED, "invalid_grant", "Invalid user credentials");
            }
            issue_tokens(&state, form.get("scope").cloned())
        },
        Some("refresh_token") => {
            let refresh = form.get("refresh_token").cloned().unwrap_or_default();
            let known = state.refresh_tokens.lock().unwrap().remove(&refresh);
            if !known {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Token is not active");
            }
            issue_tokens(&state, None)
        },
        _ => oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type", "Unsupported grant type"),
    }
}

fn issue_tokens(state: &RealmState, scope: Option<String>) -> Response {
    let n = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let refresh_token = format!("refresh-{n}");
    state.refresh_tokens.lock().unwrap().insert(refresh_token.clone());

    Json(json!({
        "access_token": format!("access-{n}"),
        "expires_in": state.access_ttl.load(Ordering::SeqCst),
        "refresh_expires_in": 1800,
        "refresh_token": refresh_token,
        "token_type": "Bearer",
        "scope": scope.unwrap_or_else(|| "solr:search solr:read".to_string()),
    }))
    .into_response()
}

fn oauth_error(status: StatusCode, error: &str, description: &str) -> Response {
    (status, Json(json!({"error": error, "error_description": description}))).into_response()
}
