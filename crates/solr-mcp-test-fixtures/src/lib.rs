//! Test fixtures for Solr MCP integration tests
//!
//! This crate provides shared test utilities for RS256 token minting, a mock
//! Keycloak realm and a mock Solr collection used across multiple test suites.

#![deny(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod claims;
pub mod keys;
pub mod mock_keycloak;
pub mod mock_solr;

pub use claims::{TestClaims, mint_token, mint_token_with_kid};
pub use keys::{PRIMARY_KID, RsaTestKey, TEST_E};
pub use mock_keycloak::{MockKeycloak, TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REALM};
pub use mock_solr::{MockSolr, MockSolrMode, TEST_COLLECTION, sample_documents};
