mod common;

use solr_mcp_search::{SearchBackend, SearchError, SearchRequest, SolrGateway, ToolResponse};
use solr_mcp_config::SolrConfig;
use solr_mcp_test_fixtures::{MockSolr, MockSolrMode};
use solr_mcp_types::{ErrorKind, MATCH_ALL};

#[tokio::test]
async fn test_title_query_finds_solr_document() {
    common::init_tracing();
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let request = SearchRequest::new("title:solr").with_rows(10).with_start(0);
    let result = gateway.try_search(&request).await.unwrap();

    assert!(result.num_found >= 1);
    assert!(result.doc_ids().contains(&"doc1".to_string()));
    assert_eq!(result.status, 0);
}

#[tokio::test]
async fn test_empty_query_sends_match_all() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let result = gateway.try_search(&SearchRequest::new("")).await.unwrap();

    assert_eq!(common::sent(&solr, "q"), vec![MATCH_ALL]);
    assert_eq!(result.num_found, 10);
    assert_eq!(result.docs.len(), 10);
}

#[tokio::test]
async fn test_optional_params_are_absent() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let result = gateway.try_search(&SearchRequest::new("python")).await.unwrap();

    let keys = common::sent_keys(&solr);
    for absent in ["fq", "sort", "facet", "facet.field", "hl", "hl.fl"] {
        assert!(!keys.iter().any(|k| k == absent), "{absent} was sent");
    }
    assert!(result.facet_counts.is_none());
    assert!(result.highlighting.is_none());
}

#[tokio::test]
async fn test_filter_and_paging() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let request = SearchRequest::match_all()
        .with_filter("category:programming")
        .with_sort("id asc")
        .with_rows(2)
        .with_start(1);
    let result = gateway.try_search(&request).await.unwrap();

    assert_eq!(common::sent(&solr, "fq"), vec!["category:programming"]);
    assert_eq!(common::sent(&solr, "sort"), vec!["id asc"]);
    assert_eq!(result.num_found, 3);
    assert_eq!(result.start, 1);
    assert_eq!(result.doc_ids(), vec!["doc4", "doc5"]);
}

#[tokio::test]
async fn test_facets_restricted_to_requested_fields() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let request = SearchRequest::match_all().with_facet_fields(["category"]).with_rows(0);
    let result = gateway.try_search(&request).await.unwrap();

    assert_eq!(common::sent(&solr, "facet"), vec!["true"]);
    assert_eq!(common::sent(&solr, "facet.field"), vec!["category"]);

    let facets = result.facet_counts.as_ref().unwrap();
    assert_eq!(facets.len(), 1);
    assert_eq!(result.facet_count("category", "technology"), Some(3));
    assert_eq!(result.facet_count("category", "programming"), Some(3));
    assert_eq!(result.facet_count("category", "cloud"), Some(1));
    assert!(result.docs.is_empty());
}

#[tokio::test]
async fn test_highlighting_with_empty_query() {
    let solr = MockSolr::start().await;
    solr.set_highlight_default("Machine");
    let gateway = common::gateway(&solr);

    let request = SearchRequest::new("").with_highlight_fields(["title"]);
    let result = gateway.try_search(&request).await.unwrap();

    assert_eq!(common::sent(&solr, "hl"), vec!["true"]);
    assert_eq!(common::sent(&solr, "hl.fl"), vec!["title"]);

    let snippets = result.snippets("doc2", "title").unwrap();
    assert!(snippets[0].contains("<em>Machine</em>"));
}

#[tokio::test]
async fn test_highlighting_uses_query_terms() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let request = SearchRequest::new("content:docker").with_highlight_fields(["title", "content"]);
    let result = gateway.try_search(&request).await.unwrap();

    assert_eq!(common::sent(&solr, "hl.fl"), vec!["title,content"]);
    let snippets = result.snippets("doc7", "content").unwrap();
    assert!(snippets[0].contains("<em>Docker</em>"));
}

#[tokio::test]
async fn test_syntax_error_propagates_as_query_error() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    let request = SearchRequest::new("title:(solr");
    let err = gateway.search(&request).await.unwrap_err();

    assert_eq!(err.status, 400);
    assert!(err.message.contains("Cannot parse"));
}

#[tokio::test]
async fn test_server_error_becomes_payload() {
    let solr = MockSolr::start().await;
    solr.set_mode(MockSolrMode::ServerError);
    let gateway = common::gateway(&solr);

    let response = gateway.search(&SearchRequest::match_all()).await.unwrap();
    let payload = response.as_error().unwrap();
    assert_eq!(payload.kind, ErrorKind::EngineFailure);
    assert!(payload.error.contains("OutOfMemoryError"));
}

#[tokio::test]
async fn test_missing_envelope_is_malformed() {
    let solr = MockSolr::start().await;
    solr.set_mode(MockSolrMode::Malformed);
    let gateway = common::gateway(&solr);

    let err = gateway.try_search(&SearchRequest::match_all()).await.unwrap_err();
    assert!(matches!(err, SearchError::MalformedResponse(_)));

    let response = gateway.search(&SearchRequest::match_all()).await.unwrap();
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_unreachable_engine_becomes_payload() {
    let config = SolrConfig {
        base_url: "http://127.0.0.1:9/solr".into(),
        connect_timeout_ms: 500,
        request_timeout_ms: 500,
        ..Default::default()
    };
    let gateway = SolrGateway::new(&config).unwrap();

    let response = gateway.search(&SearchRequest::match_all()).await.unwrap();
    match response {
        ToolResponse::Error(payload) => assert_eq!(payload.kind, ErrorKind::EngineUnreachable),
        ToolResponse::Ok(_) => panic!("unreachable engine returned results"),
    }
    assert!(gateway.ping().await.is_err());
}

#[tokio::test]
async fn test_basic_auth_only_when_configured() {
    let solr = MockSolr::start().await;
    solr.require_basic_auth("solr", "SolrRocks");

    let anonymous = common::gateway(&solr);
    let response = anonymous.search(&SearchRequest::match_all()).await.unwrap();
    assert_eq!(response.as_error().unwrap().kind, ErrorKind::EngineFailure);

    let half_configured = SolrGateway::new(&SolrConfig {
        username: Some("solr".into()),
        ..common::solr_config(&solr)
    })
    .unwrap();
    assert!(half_configured.try_search(&SearchRequest::match_all()).await.is_err());

    let authenticated = SolrGateway::new(&SolrConfig {
        username: Some("solr".into()),
        password: Some("SolrRocks".into()),
        ..common::solr_config(&solr)
    })
    .unwrap();
    assert!(authenticated.try_search(&SearchRequest::match_all()).await.is_ok());
    assert!(authenticated.ping().await.is_ok());
}

#[tokio::test]
async fn test_ping() {
    let solr = MockSolr::start().await;
    let gateway = common::gateway(&solr);

    gateway.ping().await.unwrap();
    assert_eq!(solr.ping_hits(), 1);
    assert_eq!(solr.select_hits(), 0);
}
