//! `SOLR_MCP__*` environment layer
//!
//! These tests mutate the process environment, so they serialize on
//! `ENV_LOCK` and live in their own test binary.

#![allow(unsafe_code)]

use std::{io::Write, sync::Mutex};

use solr_mcp_config::load;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Sets the given variables until dropped
struct ScopedEnv {
    keys: Vec<&'static str>,
}

impl ScopedEnv {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        for (key, value) in vars {
            // SAFETY: callers hold ENV_LOCK, no other thread reads the environment
            unsafe { std::env::set_var(key, value) };
        }
        Self { keys: vars.iter().map(|(key, _)| *key).collect() }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for key in &self.keys {
            // SAFETY: see ScopedEnv::set
            unsafe { std::env::remove_var(key) };
        }
    }
}

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_env_overrides_file_layer() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let file = write_yaml(
        "solr:\n  collection: books\n  base_url: \"http://solr:8983/solr\"\nauth:\n  required_scopes:\n    - solr:admin\n",
    );
    let _env = ScopedEnv::set(&[
        ("SOLR_MCP__SOLR__COLLECTION", "articles"),
        ("SOLR_MCP__AUTH__REQUIRED_SCOPES", "a,b"),
    ]);

    let config = load(file.path()).unwrap();

    assert_eq!(config.solr.collection, "articles");
    assert_eq!(config.auth.required_scopes, vec!["a", "b"]);
    // Untouched file values survive
    assert_eq!(config.solr.base_url, "http://solr:8983/solr");
}

#[test]
fn test_env_layer_applies_without_file() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _env = ScopedEnv::set(&[
        ("SOLR_MCP__SERVER__PORT", "9100"),
        ("SOLR_MCP__AUTH__ENABLED", "true"),
    ]);

    let config = load("/nonexistent/solr-mcp.yaml").unwrap();

    assert_eq!(config.server.port, 9100);
    assert!(config.auth.enabled);
    assert_eq!(config.solr.collection, "documents");
}
