//! Solr JSON response bodies and their normalisation

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use solr_mcp_types::{Document, FacetCounts, Highlighting, SearchResult, value_to_string};

use crate::error::{Result, SearchError};

#[derive(Debug, Deserialize)]
pub(crate) struct SelectResponse {
    #[serde(rename = "responseHeader", default)]
    pub response_header: ResponseHeader,
    #[serde(default)]
    pub response: Option<DocList>,
    #[serde(default)]
    pub facet_counts: Option<RawFacetCounts>,
    #[serde(default)]
    pub highlighting: Option<Highlighting>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponseHeader {
    #[serde(default)]
    pub status: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocList {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub docs: Vec<Document>,
}

/// Solr's facet block; `facet_fields` values are flat `[value, count, ...]`
#[derive(Debug, Deserialize)]
pub(crate) struct RawFacetCounts {
    #[serde(default)]
    pub facet_fields: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

impl SelectResponse {
    /// Parse a 2xx body, requiring the `response` envelope
    pub fn parse(body: &str) -> Result<Self> {
        let parsed: SelectResponse = serde_json::from_str(body)
            .map_err(|e| SearchError::MalformedResponse(format!("invalid JSON body: {}", e)))?;
        if parsed.response.is_none() {
            return Err(SearchError::MalformedResponse(
                "missing 'response' envelope".to_string(),
            ));
        }
        Ok(parsed)
    }

    pub fn into_result(self) -> Result<SearchResult> {
        let response = self.response.ok_or_else(|| {
            SearchError::MalformedResponse("missing 'response' envelope".to_string())
        })?;

        Ok(SearchResult {
            status: self.response_header.status,
            num_found: response.num_found,
            start: response.start,
            docs: response.docs,
            facet_counts: self.facet_counts.map(|f| normalize_facets(f.facet_fields)),
            highlighting: self.highlighting,
        })
    }
}

/// Pair flat `[value, count, ...]` lists into `value -> count`, engine order kept
pub(crate) fn normalize_facets(raw: BTreeMap<String, Vec<Value>>) -> FacetCounts {
    raw.into_iter()
        .map(|(field, flat)| {
            let counts: Map<String, Value> = flat
                .chunks_exact(2)
                .filter(|pair| pair[1].is_number())
                .map(|pair| (value_to_string(&pair[0]), pair[1].clone()))
                .collect();
            (field, counts)
        })
        .collect()
}
