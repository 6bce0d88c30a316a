//! Search and document-lookup request schemas

/// The match-all query sent when the caller supplies no query text
pub const MATCH_ALL: &str = "*:*";

/// Page size used when the caller does not ask for one
pub const DEFAULT_ROWS: u32 = 10;

/// A normalized search request
///
/// Constructed once per invocation through the `with_*` builders and
/// immutable afterwards. Empty strings never survive construction: an empty
/// query becomes [`MATCH_ALL`], and an empty filter or sort is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    filter: Option<String>,
    sort: Option<String>,
    start: u32,
    rows: u32,
    facet_fields: Vec<String>,
    highlight_fields: Vec<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::match_all()
    }
}

impl SearchRequest {
    /// Create a request for the given query text
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let query = if query.trim().is_empty() { MATCH_ALL.to_string() } else { query };

        Self {
            query,
            filter: None,
            sort: None,
            start: 0,
            rows: DEFAULT_ROWS,
            facet_fields: Vec::new(),
            highlight_fields: Vec::new(),
        }
    }

    /// Create a request matching every document
    pub fn match_all() -> Self {
        Self::new(MATCH_ALL)
    }

    /// Restrict results with a filter query
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = non_empty(filter.into());
        self
    }

    /// Order results with an engine sort expression (e.g. `score desc`)
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = non_empty(sort.into());
        self
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    /// Turn faceting on for exactly these fields
    pub fn with_facet_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_fields = field_set(fields);
        self
    }

    /// Turn highlighting on for exactly these fields
    pub fn with_highlight_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight_fields = field_set(fields);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn facet_fields(&self) -> &[String] {
        &self.facet_fields
    }

    pub fn highlight_fields(&self) -> &[String] {
        &self.highlight_fields
    }

    /// Outbound query parameters for the engine's `select` handler
    ///
    /// Optional parameters are absent, never empty-valued, when the
    /// corresponding field is unset.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.query.clone()),
            ("wt", "json".to_string()),
            ("rows", self.rows.to_string()),
            ("start", self.start.to_string()),
        ];

        if let Some(filter) = &self.filter {
            params.push(("fq", filter.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }

        if !self.facet_fields.is_empty() {
            params.push(("facet", "true".to_string()));
            for field in &self.facet_fields {
                params.push(("facet.field", field.clone()));
            }
        }

        if !self.highlight_fields.is_empty() {
            params.push(("hl", "true".to_string()));
            params.push(("hl.fl", self.highlight_fields.join(",")));
        }

        params
    }
}

/// A single-document lookup by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLookup {
    id: String,
    fields: Vec<String>,
}

impl DocumentLookup {
    /// Look up a document returning all stored fields
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: Vec::new() }
    }

    /// Limit the returned document to `id` plus these fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = field_set(fields);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The exact set of fields a lookup returns, or `None` for all fields
    ///
    /// Always leads with `id` when a field list was given.
    pub fn projection(&self) -> Option<Vec<String>> {
        if self.fields.is_empty() {
            return None;
        }

        let mut projection = vec!["id".to_string()];
        projection.extend(self.fields.iter().filter(|f| f.as_str() != "id").cloned());
        Some(projection)
    }

    /// Outbound parameters: a term query on `id` limited to one row
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", format!("{{!term f=id}}{}", self.id)),
            ("wt", "json".to_string()),
            ("rows", "1".to_string()),
        ];

        if let Some(projection) = self.projection() {
            params.push(("fl", projection.join(",")));
        }

        params
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Trim, drop blanks and deduplicate while keeping caller order
fn field_set<I, S>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for field in fields {
        let field = field.into().trim().to_string();
        if !field.is_empty() && !out.contains(&field) {
            out.push(field);
        }
    }
    out
}
