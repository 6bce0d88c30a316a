//! Metrics collection for gateway operations
//!
//! Provides structured metrics using the `metrics` crate with Prometheus export.

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Initialize all metric descriptions
pub fn init_metrics_descriptions() {
    // JWKS metrics
    describe_counter!("solr_mcp_jwks_cache_hits_total", "Total number of JWKS cache hits");
    describe_counter!("solr_mcp_jwks_cache_misses_total", "Total number of JWKS cache misses");
    describe_counter!("solr_mcp_jwks_refresh_total", "Total number of JWKS refresh operations");
    describe_counter!(
        "solr_mcp_jwks_refresh_errors_total",
        "Total number of JWKS refresh errors"
    );
    describe_histogram!(
        "solr_mcp_jwks_fetch_duration_seconds",
        "Duration of JWKS fetch operations in seconds"
    );

    // Token validation metrics
    describe_counter!(
        "solr_mcp_token_validations_total",
        "Total number of token validations by strategy and outcome"
    );
    describe_histogram!(
        "solr_mcp_token_validation_duration_seconds",
        "Duration of token validations in seconds"
    );
    describe_counter!(
        "solr_mcp_scope_denials_total",
        "Total number of tokens rejected for missing scopes"
    );
    describe_counter!(
        "solr_mcp_token_requests_total",
        "Total number of token endpoint requests by grant type"
    );
    describe_histogram!(
        "solr_mcp_provider_request_duration_seconds",
        "Duration of identity provider requests in seconds"
    );

    // Search engine metrics
    describe_counter!(
        "solr_mcp_solr_requests_total",
        "Total number of search engine requests by operation and outcome"
    );
    describe_histogram!(
        "solr_mcp_solr_request_duration_seconds",
        "Duration of search engine requests in seconds"
    );

    // API metrics
    describe_counter!(
        "solr_mcp_tool_calls_total",
        "Total number of tool invocations by tool and outcome"
    );
    describe_counter!(
        "solr_mcp_api_requests_total",
        "Total number of REST requests by endpoint and status"
    );
    describe_histogram!(
        "solr_mcp_api_request_duration_seconds",
        "Duration of REST requests in seconds"
    );
}

/// Record a JWKS cache hit
pub fn record_jwks_cache_hit() {
    counter!("solr_mcp_jwks_cache_hits_total").increment(1);
}

/// Record a JWKS cache miss
pub fn record_jwks_cache_miss() {
    counter!("solr_mcp_jwks_cache_misses_total").increment(1);
}

/// Record a JWKS refresh operation
pub fn record_jwks_refresh(duration_seconds: f64, success: bool) {
    counter!("solr_mcp_jwks_refresh_total").increment(1);

    if !success {
        counter!("solr_mcp_jwks_refresh_errors_total").increment(1);
    }

    histogram!("solr_mcp_jwks_fetch_duration_seconds").record(duration_seconds);
}

/// Record one token validation
pub fn record_token_validation(strategy: &str, outcome: &str, duration_seconds: f64) {
    counter!(
        "solr_mcp_token_validations_total",
        "strategy" => strategy.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!("solr_mcp_token_validation_duration_seconds", "strategy" => strategy.to_string())
        .record(duration_seconds);
}

/// Record a token rejected for missing scopes
pub fn record_scope_denial() {
    counter!("solr_mcp_scope_denials_total").increment(1);
}

/// Record a token endpoint call
pub fn record_token_request(grant_type: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "solr_mcp_token_requests_total",
        "grant_type" => grant_type.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record latency of any identity provider call
pub fn record_provider_request(endpoint: &str, duration_seconds: f64) {
    histogram!("solr_mcp_provider_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration_seconds);
}

/// Record one search engine request
pub fn record_solr_request(operation: &str, outcome: &str, duration_seconds: f64) {
    counter!(
        "solr_mcp_solr_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!("solr_mcp_solr_request_duration_seconds", "operation" => operation.to_string())
        .record(duration_seconds);
}

/// Record one tool invocation from either adapter
pub fn record_tool_call(tool: &str, outcome: &str) {
    counter!(
        "solr_mcp_tool_calls_total",
        "tool" => tool.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record one REST request
pub fn record_api_request(endpoint: &str, status_code: u16, duration_seconds: f64) {
    counter!(
        "solr_mcp_api_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!("solr_mcp_api_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration_seconds);
}
