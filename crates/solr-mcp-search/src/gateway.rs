//! Solr `select` client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use solr_mcp_config::SolrConfig;
use solr_mcp_types::{Document, DocumentLookup, ErrorPayload, SearchRequest, SearchResult, ToolResponse};
use tracing::Instrument;

use crate::{
    backend::SearchBackend,
    error::{EngineQueryError, Result, SearchError, truncate_body},
    wire::{ErrorBody, SelectResponse},
};

/// Turns requests into one `GET {base}/{collection}/select` each
pub struct SolrGateway {
    http_client: reqwest::Client,
    collection: String,
    select_url: String,
    ping_url: String,
    credentials: Option<(String, String)>,
}

impl SolrGateway {
    pub fn new(config: &SolrConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SearchError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = config.credentials().map(|(u, p)| (u.to_string(), p.to_string()));

        tracing::info!(
            select_url = %config.select_url(),
            basic_auth = credentials.is_some(),
            "Solr gateway configured"
        );

        Ok(Self {
            http_client,
            collection: config.collection.clone(),
            select_url: config.select_url(),
            ping_url: config.ping_url(),
            credentials,
        })
    }

    pub fn select_url(&self) -> &str {
        &self.select_url
    }

    /// Run a search, surfacing every failure as a [`SearchError`]
    pub async fn try_search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let span =
            solr_mcp_observe::logging::search_span("search", &self.collection, request.query());
        let start = Instant::now();

        let result = self.execute(&request.params()).instrument(span.clone()).await;
        self.finish("search", &span, start, &result);

        result
    }

    /// Fetch one document by id, `NotFound` when nothing matches
    pub async fn try_get_document(&self, lookup: &DocumentLookup) -> Result<Document> {
        let span =
            solr_mcp_observe::logging::search_span("get_document", &self.collection, lookup.id());
        let start = Instant::now();

        let result = async {
            let found = self.execute(&lookup.params()).await?;
            let mut doc = found
                .docs
                .into_iter()
                .next()
                .ok_or_else(|| SearchError::NotFound { id: lookup.id().to_string() })?;

            if let Some(projection) = lookup.projection() {
                doc.retain(|field, _| projection.iter().any(|p| p == field));
            }
            Ok::<_, SearchError>(doc)
        }
        .instrument(span.clone())
        .await;

        let elapsed = start.elapsed();
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        solr_mcp_observe::metrics::record_solr_request("get_document", outcome, elapsed.as_secs_f64());
        solr_mcp_observe::logging::record_search_result(
            &span,
            result.as_ref().ok().map(|_| 1),
            outcome,
            elapsed.as_millis(),
        );
        if let Err(e) = &result {
            log_failure(e, &self.select_url, lookup.id());
        }

        result
    }

    /// `GET {base}/{collection}/admin/ping?wt=json`
    pub async fn try_ping(&self) -> Result<()> {
        let start = Instant::now();
        let mut request = self.http_client.get(&self.ping_url).query(&[("wt", "json")]);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                Err(engine_error(status, &body))
            },
            Err(e) => Err(SearchError::EngineUnreachable(format!("{}: {}", self.ping_url, e))),
        };

        let outcome = match &result {
            Ok(()) => "success",
            Err(e) => e.outcome(),
        };
        solr_mcp_observe::metrics::record_solr_request("ping", outcome, start.elapsed().as_secs_f64());
        result
    }

    async fn execute(&self, params: &[(&'static str, String)]) -> Result<SearchResult> {
        let mut request = self.http_client.get(&self.select_url).query(params);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::EngineUnreachable(format!("{}: {}", self.select_url, e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SearchError::EngineUnreachable(format!("failed reading response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(engine_error(status, &body));
        }

        SelectResponse::parse(&body)?.into_result()
    }

    fn finish(
        &self,
        operation: &str,
        span: &tracing::Span,
        start: Instant,
        result: &Result<SearchResult>,
    ) {
        let elapsed = start.elapsed();
        let outcome = match result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        solr_mcp_observe::metrics::record_solr_request(operation, outcome, elapsed.as_secs_f64());
        solr_mcp_observe::logging::record_search_result(
            span,
            result.as_ref().ok().map(|r| r.num_found),
            outcome,
            elapsed.as_millis(),
        );

        match result {
            Ok(found) => tracing::debug!(
                collection = %self.collection,
                num_found = found.num_found,
                returned = found.docs.len(),
                "Search completed"
            ),
            Err(e) => log_failure(e, &self.select_url, ""),
        }
    }
}

fn log_failure(err: &SearchError, endpoint: &str, id: &str) {
    match err {
        SearchError::NotFound { .. } => tracing::debug!(id = %id, "Document not found"),
        SearchError::EngineQuery(e) => {
            tracing::info!(endpoint = %endpoint, status = e.status, error = %e, "Engine rejected query")
        },
        other => tracing::error!(endpoint = %endpoint, error = %other, "Search engine request failed"),
    }
}

/// Classify a non-success engine response
///
/// A 4xx carrying Solr's `error` object is a query error; authentication
/// failures and everything else are engine failures.
fn engine_error(status: StatusCode, body: &str) -> SearchError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.msg.clone())
        .unwrap_or_else(|| truncate_body(body));

    let query_error = status.is_client_error()
        && status != StatusCode::UNAUTHORIZED
        && status != StatusCode::FORBIDDEN
        && detail.is_some();

    if query_error {
        SearchError::EngineQuery(EngineQueryError {
            status: status.as_u16(),
            message,
            code: detail.and_then(|d| d.code),
        })
    } else {
        SearchError::EngineFailure { status: status.as_u16(), message }
    }
}

#[async_trait]
impl SearchBackend for SolrGateway {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<ToolResponse<SearchResult>, EngineQueryError> {
        match self.try_search(request).await {
            Ok(result) => Ok(ToolResponse::Ok(result)),
            Err(SearchError::EngineQuery(e)) => Err(e),
            Err(e) => Ok(ToolResponse::Error(ErrorPayload::from(&e))),
        }
    }

    async fn get_document(
        &self,
        lookup: &DocumentLookup,
    ) -> std::result::Result<ToolResponse<Document>, EngineQueryError> {
        match self.try_get_document(lookup).await {
            Ok(doc) => Ok(ToolResponse::Ok(doc)),
            Err(SearchError::EngineQuery(e)) => Err(e),
            Err(e) => Ok(ToolResponse::Error(ErrorPayload::from(&e))),
        }
    }

    async fn ping(&self) -> Result<()> {
        self.try_ping().await
    }
}
