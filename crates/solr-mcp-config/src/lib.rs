//! # Solr MCP Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables.
//!
//! ```yaml
//! server:
//!   name: "Solr Search"
//!   port: 8765
//! solr:
//!   base_url: "http://localhost:8983/solr"
//!   collection: "documents"
//! auth:
//!   enabled: true
//!   provider_url: "http://localhost:8080"
//!   realm: "solr-mcp"
//!   client_id: "solr-search-server"
//!   required_scopes: ["solr:search", "solr:read"]
//! observability:
//!   log_level: "info"
//!   log_format: "compact"
//! ```
//!
//! Configuration is loaded once at startup. The auth section is resolved into
//! an immutable [`OAuthConfig`] with every endpoint derived.

pub mod oauth;
pub mod validation;

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
pub use oauth::{AutoRefreshCredentials, OAuthConfig, ValidationStrategy};
use serde::{Deserialize, Deserializer, Serialize};
pub use validation::ValidationError;

/// Prefix for environment overrides, e.g. `SOLR_MCP__SOLR__COLLECTION=books`
pub const ENV_PREFIX: &str = "SOLR_MCP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub solr: SolrConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Validate every section, collecting all failures
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

/// Listener and identity of the server process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported to MCP clients and on `/server_info`
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Bind host for the REST mirror
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the REST mirror
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { name: default_server_name(), host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    /// `host:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_server_name() -> String {
    "Solr Search".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8765
}

/// Backing search engine
#[derive(Clone, Serialize, Deserialize)]
pub struct SolrConfig {
    /// Base URL up to and including the `/solr` context path
    #[serde(default = "default_solr_base_url")]
    pub base_url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// HTTP Basic credentials, used only when both are set
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            base_url: default_solr_base_url(),
            collection: default_collection(),
            username: None,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for SolrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolrConfig")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl SolrConfig {
    /// `{base}/{collection}/select`
    pub fn select_url(&self) -> String {
        format!("{}/{}/select", self.base_url.trim_end_matches('/'), self.collection)
    }

    /// `{base}/{collection}/admin/ping`
    pub fn ping_url(&self) -> String {
        format!("{}/{}/admin/ping", self.base_url.trim_end_matches('/'), self.collection)
    }

    /// Basic credentials when both username and password are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

fn default_solr_base_url() -> String {
    "http://localhost:8983/solr".to_string()
}

fn default_collection() -> String {
    "documents".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Raw identity-provider settings as loaded
///
/// Call [`AuthConfig::resolve`] to obtain the derived, immutable [`OAuthConfig`].
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false no other auth field is consulted
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_provider")]
    pub provider: String,

    /// Identity provider base URL (e.g. the Keycloak root)
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    #[serde(default = "default_realm")]
    pub realm: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// Every scope here must be present on a token
    ///
    /// Accepts a list or a comma-separated string.
    #[serde(default = "default_required_scopes", deserialize_with = "deserialize_scopes")]
    pub required_scopes: Vec<String>,

    /// Expected `aud` claim for local validation
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Expected `iss` claim; derived from `provider_url` and `realm` when absent
    pub issuer: Option<String>,

    pub introspection_endpoint: Option<String>,
    pub jwks_endpoint: Option<String>,
    pub token_endpoint: Option<String>,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl: u64,

    /// Minimum age of the cached JWKS before an unknown `kid` may force a
    /// refetch, in seconds
    #[serde(default = "default_jwks_min_refresh_interval")]
    pub jwks_min_refresh_interval: u64,

    /// Leeway applied to `exp`/`nbf` checks, in seconds
    #[serde(default = "default_clock_skew_seconds")]
    pub clock_skew_seconds: u64,

    #[serde(default)]
    pub strategy: ValidationStrategy,

    /// Timeout for every identity provider call, in milliseconds
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Service account used to keep a token of our own current
    pub auto_refresh: Option<AutoRefreshCredentials>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            provider_url: default_provider_url(),
            realm: default_realm(),
            client_id: default_client_id(),
            client_secret: String::new(),
            required_scopes: default_required_scopes(),
            audience: default_audience(),
            issuer: None,
            introspection_endpoint: None,
            jwks_endpoint: None,
            token_endpoint: None,
            jwks_cache_ttl: default_jwks_cache_ttl(),
            jwks_min_refresh_interval: default_jwks_min_refresh_interval(),
            clock_skew_seconds: default_clock_skew_seconds(),
            strategy: ValidationStrategy::default(),
            http_timeout_ms: default_http_timeout_ms(),
            auto_refresh: None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("provider_url", &self.provider_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("required_scopes", &self.required_scopes)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("strategy", &self.strategy)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .field("auto_refresh", &self.auto_refresh)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Whether endpoints can be derived from `provider_url` and `realm`
    pub fn is_keycloak(&self) -> bool {
        self.provider.eq_ignore_ascii_case("keycloak")
    }

    /// `{provider_url}/realms/{realm}`
    pub fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.provider_url.trim_end_matches('/'), self.realm)
    }
}

fn default_provider() -> String {
    "keycloak".to_string()
}

fn default_provider_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_realm() -> String {
    "solr-mcp".to_string()
}

fn default_client_id() -> String {
    "solr-search-server".to_string()
}

fn default_required_scopes() -> Vec<String> {
    vec!["solr:search".to_string(), "solr:read".to_string()]
}

fn default_audience() -> String {
    "account".to_string()
}

fn default_jwks_cache_ttl() -> u64 {
    3_600
}

fn default_jwks_min_refresh_interval() -> u64 {
    30
}

fn default_clock_skew_seconds() -> u64 {
    60
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        Joined(String),
        List(Vec<String>),
    }

    let scopes = match Scopes::deserialize(deserializer)? {
        Scopes::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        Scopes::List(list) => list,
    };

    Ok(scopes.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

/// Logging and metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Address for the Prometheus scrape endpoint; disabled when absent
    pub metrics_listen: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_format: default_log_format(), metrics_listen: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

/// Load configuration with layered precedence: defaults → file → env vars
///
/// Each layer only overrides properties that are explicitly set, preserving
/// defaults for unspecified values. Environment variables use the
/// `SOLR_MCP__` prefix with `__` between nested keys:
/// - `SOLR_MCP__SERVER__PORT=9000`
/// - `SOLR_MCP__SOLR__BASE_URL=http://solr:8983/solr`
/// - `SOLR_MCP__AUTH__ENABLED=true`
/// - `SOLR_MCP__AUTH__REQUIRED_SCOPES=solr:search,solr:read`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let builder = ConfigBuilder::builder().add_source(File::from(path.as_ref()).required(false));

    let builder =
        builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true));

    builder.build()?.try_deserialize()
}

/// Load configuration, falling back to defaults on any error
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
    match load(path.as_ref()) {
        Ok(config) => {
            tracing::info!(path = ?path.as_ref(), "Configuration loaded");
            config
        },
        Err(e) => {
            tracing::warn!(
                path = ?path.as_ref(),
                error = %e,
                "Failed to load config, using defaults"
            );
            Config::default()
        },
    }
}
