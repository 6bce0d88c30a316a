//! Shared helpers for gateway integration tests

#![allow(dead_code)]

use solr_mcp_config::SolrConfig;
use solr_mcp_search::SolrGateway;
use solr_mcp_test_fixtures::MockSolr;

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

pub fn gateway(solr: &MockSolr) -> SolrGateway {
    SolrGateway::new(&solr_config(solr)).expect("gateway builds")
}

/// Every value sent for `key` in the most recent request
pub fn sent(solr: &MockSolr, key: &str) -> Vec<String> {
    solr.last_params().into_iter().filter(|(k, _)| k == key).map(|(_, v)| v).collect()
}

pub fn sent_keys(solr: &MockSolr) -> Vec<String> {
    solr.last_params().into_iter().map(|(k, _)| k).collect()
}
