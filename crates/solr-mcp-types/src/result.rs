//! Normalized search results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single document: field name to value or value-list, in engine order
pub type Document = Map<String, Value>;

/// Facet counts: field name to (value to count), values in engine order
pub type FacetCounts = BTreeMap<String, Map<String, Value>>;

/// Highlight snippets: document id to field name to snippets
pub type Highlighting = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// The normalized outcome of one successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Status reported in the engine's `responseHeader`
    pub status: i64,
    #[serde(rename = "numFound")]
    pub num_found: u64,
    pub start: u64,
    pub docs: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_counts: Option<FacetCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighting: Option<Highlighting>,
}

impl SearchResult {
    /// The `id` of every returned document, stringified
    pub fn doc_ids(&self) -> Vec<String> {
        self.docs.iter().filter_map(|doc| doc.get("id").map(value_to_string)).collect()
    }

    /// Count for one facet value, if the engine reported it
    pub fn facet_count(&self, field: &str, value: &str) -> Option<u64> {
        self.facet_counts.as_ref()?.get(field)?.get(value)?.as_u64()
    }

    /// Highlight snippets for one document field
    pub fn snippets(&self, doc_id: &str, field: &str) -> Option<&[String]> {
        self.highlighting.as_ref()?.get(doc_id)?.get(field).map(Vec::as_slice)
    }
}

/// Render a JSON scalar (typically a document id) as a plain string
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
