//! Tool-call schemas shared by the MCP and REST adapters
//!
//! Each operation has one explicit schema, validated once here. Everything
//! past [`SearchToolCall::to_request`] works with the normalized
//! [`SearchRequest`] / [`DocumentLookup`] types.

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use solr_mcp_types::{DEFAULT_ROWS, DocumentLookup, SearchRequest};

use crate::error::{ApiError, Result};

/// Arguments of the `search` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchToolCall {
    #[schemars(description = "Solr query, e.g. 'title:solr' or 'machine learning'. Empty matches all documents")]
    #[serde(default)]
    pub query: String,

    #[schemars(description = "Filter query restricting results without affecting scores, e.g. 'category:technology'")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_query: Option<String>,

    #[schemars(description = "Sort expression, e.g. 'score desc' or 'id asc'")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    #[schemars(description = "Number of documents to return (default 10)")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,

    #[schemars(description = "Offset of the first document returned (default 0)")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    #[schemars(description = "Fields to compute facet counts for")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_fields: Option<Vec<String>>,

    #[schemars(description = "Fields to return highlighted snippets for")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_fields: Option<Vec<String>>,

    #[schemars(description = "OAuth2 access token, raw or 'Bearer <token>'. Required when authentication is enabled")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl SearchToolCall {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    /// Validate and normalize into a [`SearchRequest`]
    pub fn to_request(&self) -> Result<SearchRequest> {
        let rows = non_negative("rows", self.rows)?.unwrap_or(DEFAULT_ROWS);
        let start = non_negative("start", self.start)?.unwrap_or(0);

        let mut request = SearchRequest::new(self.query.as_str()).with_rows(rows).with_start(start);
        if let Some(filter) = &self.filter_query {
            request = request.with_filter(filter.as_str());
        }
        if let Some(sort) = &self.sort {
            request = request.with_sort(sort.as_str());
        }
        if let Some(fields) = &self.facet_fields {
            request = request.with_facet_fields(fields.iter().map(String::as_str));
        }
        if let Some(fields) = &self.highlight_fields {
            request = request.with_highlight_fields(fields.iter().map(String::as_str));
        }
        Ok(request)
    }
}

/// Arguments of the `get_document` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DocumentToolCall {
    #[schemars(description = "Unique id of the document")]
    pub id: String,

    #[schemars(description = "Fields to return; all stored fields when omitted")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[schemars(description = "OAuth2 access token, raw or 'Bearer <token>'. Required when authentication is enabled")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl DocumentToolCall {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Validate and normalize into a [`DocumentLookup`]
    pub fn to_lookup(&self) -> Result<DocumentLookup> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidRequest("Document id must not be empty".to_string()));
        }

        let mut lookup = DocumentLookup::new(id);
        if let Some(fields) = &self.fields {
            lookup = lookup.with_fields(fields.iter().map(String::as_str));
        }
        Ok(lookup)
    }
}

fn non_negative(name: &str, value: Option<i64>) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => {
            Err(ApiError::InvalidRequest(format!("{name} must be non-negative, got {v}")))
        },
        Some(v) => u32::try_from(v)
            .map(Some)
            .map_err(|_| ApiError::InvalidRequest(format!("{name} is too large: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minimal_search_call() {
        let call: SearchToolCall = serde_json::from_value(json!({})).unwrap();
        let request = call.to_request().unwrap();
        assert_eq!(request.query(), "*:*");
        assert_eq!(request.rows(), 10);
        assert_eq!(request.start(), 0);
        assert!(request.filter().is_none());
    }

    #[test]
    fn test_full_search_call() {
        let call: SearchToolCall = serde_json::from_value(json!({
            "query": "title:solr",
            "filter_query": "category:technology",
            "sort": "score desc",
            "rows": 5,
            "start": 10,
            "facet_fields": ["category", "author"],
            "highlight_fields": ["title"],
            "access_token": "abc"
        }))
        .unwrap();

        let request = call.to_request().unwrap();
        assert_eq!(request.filter(), Some("category:technology"));
        assert_eq!(request.sort(), Some("score desc"));
        assert_eq!(request.rows(), 5);
        assert_eq!(request.start(), 10);
        assert_eq!(request.facet_fields(), ["category", "author"]);
        assert_eq!(request.highlight_fields(), ["title"]);
    }

    #[test]
    fn test_negative_paging_is_rejected() {
        let call = SearchToolCall { rows: Some(-1), ..SearchToolCall::new("x") };
        assert!(matches!(call.to_request(), Err(ApiError::InvalidRequest(_))));

        let call = SearchToolCall { start: Some(-5), ..SearchToolCall::new("x") };
        let err = call.to_request().unwrap_err();
        assert!(err.to_string().contains("start"));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        assert!(DocumentToolCall::new("  ").to_lookup().is_err());

        let lookup = DocumentToolCall {
            fields: Some(vec!["title".into()]),
            ..DocumentToolCall::new("doc1")
        }
        .to_lookup()
        .unwrap();
        assert_eq!(lookup.projection().unwrap(), vec!["id", "title"]);
    }

    #[test]
    fn test_id_is_required() {
        assert!(serde_json::from_value::<DocumentToolCall>(json!({"fields": ["a"]})).is_err());
    }
}
