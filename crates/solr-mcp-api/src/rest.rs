//! REST mirror of the MCP tools
//!
//! Same dispatcher, same payloads; failures additionally get an HTTP status
//! from [`status_for`](crate::error::status_for).

use std::{future::Future, net::SocketAddr, sync::Arc, time::Instant};

use axum::{
    Json, Router,
    extract::{MatchedPath, Path, Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use solr_mcp_auth::extract_bearer;
use solr_mcp_types::ToolResponse;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::{
    dispatcher::{HealthStatus, ToolDispatcher},
    error::{ApiError, Result, payload_response},
    schema::{DocumentToolCall, SearchToolCall},
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ToolDispatcher>,
}

/// Build the REST router
pub fn router(dispatcher: Arc<ToolDispatcher>) -> Router {
    let state = AppState { dispatcher };

    Router::new()
        .route("/server_info", get(server_info_handler))
        .route("/tool/search", post(search_handler))
        .route("/tool/get_document", post(get_document_handler))
        .route("/resource/search/{query}", get(search_resource_handler))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn(track_request))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

/// Serve `router` on `addr` until `shutdown` resolves
pub async fn serve_http(
    router: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(listen = %addr, "REST server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::Server(format!("HTTP server error: {}", e)))?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn server_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dispatcher.server_info())
}

async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<SearchToolCall>, JsonRejection>,
) -> Response {
    let Json(mut call) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    call.access_token = header_token(&headers).or(call.access_token);

    tool_response(state.dispatcher.dispatch_search(call).await)
}

async fn get_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<DocumentToolCall>, JsonRejection>,
) -> Response {
    let Json(mut call) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    call.access_token = header_token(&headers).or(call.access_token);

    tool_response(state.dispatcher.dispatch_get_document(call).await)
}

/// `solr://search/{query}` as a GET with default paging
async fn search_resource_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(query): Path<String>,
) -> Response {
    let call = SearchToolCall { access_token: header_token(&headers), ..SearchToolCall::new(query) };
    tool_response(state.dispatcher.dispatch_search(call).await)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.dispatcher.health().await;
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

// ============================================================================
// Helpers
// ============================================================================

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer)
        .map(str::to_string)
}

fn tool_response<T: Serialize>(response: ToolResponse<T>) -> Response {
    match response {
        ToolResponse::Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        ToolResponse::Error(payload) => payload_response(payload),
    }
}

fn rejected_body(rejection: JsonRejection) -> Response {
    ApiError::InvalidRequest(rejection.body_text()).into_response()
}

/// Per-request span, latency log and metrics
async fn track_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span = solr_mcp_observe::logging::api_span(&method, &route);
    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    solr_mcp_observe::logging::record_api_result(&span, status, elapsed.as_millis());
    solr_mcp_observe::metrics::record_api_request(&route, status, elapsed.as_secs_f64());

    span.in_scope(|| {
        tracing::debug!(method = %method, route = %route, status, "Request completed");
    });

    response
}
