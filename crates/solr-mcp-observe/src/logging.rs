//! Structured logging utilities
//!
//! Provides subscriber initialization and span helpers with the fields the
//! gateway logs against: endpoint, collection, query, subject.

use std::str::FromStr;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Filter used when neither the config nor `RUST_LOG` sets one
pub const DEFAULT_FILTER: &str = "info,solr_mcp=debug";

/// Log output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
    /// JSON format (for production)
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Whether to include file/line numbers
    pub include_location: bool,
    /// Whether to include target module
    pub include_target: bool,
    /// Whether to log span events (enter/exit/close)
    pub log_spans: bool,
    /// Environment filter (e.g., "info,solr_mcp=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            include_location: cfg!(debug_assertions),
            include_target: true,
            log_spans: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Build from the configured level and format names
    ///
    /// `RUST_LOG` still wins over `level` when set.
    pub fn from_settings(level: &str, format: &str) -> Self {
        let env = std::env::var("RUST_LOG").ok();
        Self::from_parts(env.as_deref(), level, format)
    }

    /// The configured level applies to every target, ours included
    fn from_parts(rust_log: Option<&str>, level: &str, format: &str) -> Self {
        let filter = rust_log
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| level.to_string());

        Self { format: format.parse().unwrap_or_default(), filter: Some(filter), ..Self::default() }
    }
}

/// Initialize structured logging on stderr
pub fn init_logging(config: LogConfig) -> anyhow::Result<()> {
    let env_filter = if let Some(filter) = config.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let fmt_span = if config.log_spans { FmtSpan::NEW | FmtSpan::CLOSE } else { FmtSpan::NONE };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(fmt_span);

    match config.format {
        LogFormat::Pretty => {
            subscriber
                .pretty()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logger: {}", e))?;
        },
        LogFormat::Compact => {
            subscriber
                .compact()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize compact logger: {}", e))?;
        },
        LogFormat::Json => {
            subscriber
                .json()
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logger: {}", e))?;
        },
    }

    tracing::info!(
        format = ?config.format,
        location = config.include_location,
        target = config.include_target,
        "Logging initialized"
    );

    Ok(())
}

/// Span for one engine query
pub fn search_span(operation: &str, collection: &str, query: &str) -> Span {
    tracing::info_span!(
        "search",
        operation = operation,
        collection = collection,
        query = query,
        num_found = tracing::field::Empty,
        outcome = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Span for one token validation
///
/// `token_fingerprint` is a hash prefix, never the token itself.
pub fn auth_span(strategy: &str, token_fingerprint: &str) -> Span {
    tracing::info_span!(
        "token_validation",
        strategy = strategy,
        token_fingerprint = token_fingerprint,
        subject = tracing::field::Empty,
        outcome = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Helper to create a span for API requests
pub fn api_span(method: &str, path: &str) -> Span {
    tracing::info_span!(
        "api_request",
        http.method = method,
        http.route = path,
        http.status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Record the outcome of an engine query
pub fn record_search_result(span: &Span, num_found: Option<u64>, outcome: &str, duration_ms: u128) {
    if let Some(n) = num_found {
        span.record("num_found", n);
    }
    span.record("outcome", outcome);
    span.record("duration_ms", duration_ms);
}

/// Record the outcome of a token validation
pub fn record_auth_result(span: &Span, subject: Option<&str>, outcome: &str, duration_ms: u128) {
    if let Some(subject) = subject {
        span.record("subject", subject);
    }
    span.record("outcome", outcome);
    span.record("duration_ms", duration_ms);
}

/// Record API request results
pub fn record_api_result(span: &Span, status_code: u16, duration_ms: u128) {
    span.record("http.status_code", status_code);
    span.record("duration_ms", duration_ms);
}
