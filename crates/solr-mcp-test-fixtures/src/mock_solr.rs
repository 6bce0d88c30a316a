//! In-process mock of one Solr collection
//!
//! Implements enough of the `select` handler to exercise the gateway:
//! `field:term` and bare-term clauses (OR), `{!term f=...}` point lookups,
//! `fq`, paging, `fl`, `facet.field` and `hl.fl`. Malformed queries get a
//! Solr-shaped 400. Every request's parameters are recorded.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use base64::Engine;
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;

pub const TEST_COLLECTION: &str = "documents";

/// How the mock answers `select`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSolrMode {
    /// Evaluate queries against the documents
    Normal,
    /// 500 with a Solr error body
    ServerError,
    /// 200 with no `response` envelope
    Malformed,
}

struct CollectionState {
    docs: Mutex<Vec<Value>>,
    mode: Mutex<MockSolrMode>,
    highlight_default: Mutex<Option<String>>,
    basic_auth: Mutex<Option<String>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
    select_hits: AtomicUsize,
    ping_hits: AtomicUsize,
}

/// A running mock collection; the server stops when this is dropped
pub struct MockSolr {
    base_url: String,
    state: Arc<CollectionState>,
    handle: JoinHandle<()>,
}

impl MockSolr {
    /// Start on a random local port serving [`sample_documents`]
    pub async fn start() -> Self {
        Self::start_with(sample_documents()).await
    }

    pub async fn start_with(docs: Vec<Value>) -> Self {
        let state = Arc::new(CollectionState {
            docs: Mutex::new(docs),
            mode: Mutex::new(MockSolrMode::Normal),
            highlight_default: Mutex::new(None),
            basic_auth: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            select_hits: AtomicUsize::new(0),
            ping_hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(&format!("/solr/{TEST_COLLECTION}/select"), get(select_handler))
            .route(&format!("/solr/{TEST_COLLECTION}/admin/ping"), get(ping_handler))
            .with_state(state.clone());

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let base_url = format!("http://{}/solr", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state, handle }
    }

    /// Base URL including the `/solr` context path
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection(&self) -> &str {
        TEST_COLLECTION
    }

    pub fn set_mode(&self, mode: MockSolrMode) {
        *self.state.mode.lock().unwrap() = mode;
    }

    /// A handler-level `hl.q` default, as a `solrconfig.xml` `<defaults>` entry sets
    pub fn set_highlight_default(&self, terms: &str) {
        *self.state.highlight_default.lock().unwrap() = Some(terms.to_string());
    }

    /// Require HTTP Basic credentials on every request
    pub fn require_basic_auth(&self, username: &str, password: &str) {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        *self.state.basic_auth.lock().unwrap() = Some(format!("Basic {encoded}"));
    }

    pub fn select_hits(&self) -> usize {
        self.state.select_hits.load(Ordering::SeqCst)
    }

    pub fn ping_hits(&self) -> usize {
        self.state.ping_hits.load(Ordering::SeqCst)
    }

    /// Parameters of the most recent `select`, in wire order
    pub fn last_params(&self) -> Vec<(String, String)> {
        self.state.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Drop for MockSolr {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The ten documents the development Solr image is seeded with
pub fn sample_documents() -> Vec<Value> {
    let rows = [
        ("doc1", "Introduction to Apache Solr", "Apache Solr is an open-source search platform built on Apache Lucene.", "technology", "John Smith"),
        ("doc2", "Machine Learning Basics", "Machine learning is a method of data analysis that automates analytical model building.", "technology", "Jane Doe"),
        ("doc3", "Python Programming Guide", "Python is an interpreted, high-level, general-purpose programming language.", "programming", "John Smith"),
        ("doc4", "Data Structures and Algorithms", "A data structure is a particular way of organizing data in a computer.", "programming", "Alice Johnson"),
        ("doc5", "Web Development with JavaScript", "JavaScript is a programming language used to create dynamic content for websites.", "programming", "Bob Brown"),
        ("doc6", "Database Design Principles", "Database design is the process of producing a detailed data model of a database.", "database", "Carol White"),
        ("doc7", "Introduction to Docker", "Docker is a platform for developing, shipping, and running applications in containers.", "devops", "David Green"),
        ("doc8", "RESTful API Design", "REST is an architectural style for designing networked applications.", "api", "Emma Black"),
        ("doc9", "Cloud Computing Fundamentals", "Cloud computing is the on-demand delivery of IT resources over the Internet.", "cloud", "Frank Gray"),
        ("doc10", "Artificial Intelligence Overview", "Artificial intelligence is the simulation of human intelligence in machines.", "technology", "Grace Lee"),
    ];

    rows.iter()
        .map(|(id, title, content, category, author)| {
            json!({
                "id": id,
                "title": title,
                "content": content,
                "category": category,
                "author": author,
                "tags": [category, "sample"],
            })
        })
        .collect()
}

async fn ping_handler(State(state): State<Arc<CollectionState>>, headers: HeaderMap) -> Response {
    state.ping_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }
    Json(json!({"responseHeader": {"status": 0, "QTime": 0}, "status": "OK"})).into_response()
}

async fn select_handler(
    State(state): State<Arc<CollectionState>>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    state.select_hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(params.clone());

    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    match *state.mode.lock().unwrap() {
        MockSolrMode::ServerError => {
            return solr_error(StatusCode::INTERNAL_SERVER_ERROR, "java.lang.OutOfMemoryError: Java heap space");
        },
        MockSolrMode::Malformed => {
            return Json(json!({"responseHeader": {"status": 0}, "unexpected": true})).into_response();
        },
        MockSolrMode::Normal => {},
    }

    let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
    let get_all = |key: &str| -> Vec<String> {
        params.iter().filter(|(k, _)| k == key).map(|(_, v)| v.clone()).collect()
    };

    let q = get("q").unwrap_or_else(|| "*:*".to_string());
    let query = match Clauses::parse(&q) {
        Ok(query) => query,
        Err(msg) => return solr_error(StatusCode::BAD_REQUEST, &msg),
    };
    let mut filters = Vec::new();
    for fq in get_all("fq") {
        match Clauses::parse(&fq) {
            Ok(filter) => filters.push(filter),
            Err(msg) => return solr_error(StatusCode::BAD_REQUEST, &msg),
        }
    }

    let rows: usize = get("rows").and_then(|r| r.parse().ok()).unwrap_or(10);
    let start: usize = get("start").and_then(|s| s.parse().ok()).unwrap_or(0);

    let docs = state.docs.lock().unwrap().clone();
    let matched: Vec<Value> = docs
        .into_iter()
        .filter(|doc| query.matches(doc) && filters.iter().all(|f| f.matches(doc)))
        .collect();

    let page: Vec<Value> = matched.iter().skip(start).take(rows).cloned().collect();

    let mut body = json!({
        "responseHeader": {"status": 0, "QTime": 1},
        "response": {
            "numFound": matched.len(),
            "start": start,
            "numFoundExact": true,
            "docs": page.iter().map(|d| project(d, get("fl").as_deref())).collect::<Vec<_>>(),
        },
    });

    if get("facet").as_deref() == Some("true") {
        let mut fields = Map::new();
        for field in get_all("facet.field") {
            fields.insert(field.clone(), Value::Array(facet_counts(&matched, &field)));
        }
        body["facet_counts"] = json!({
            "facet_queries": {},
            "facet_fields": fields,
            "facet_ranges": {},
            "facet_intervals": {},
            "facet_heatmaps": {},
        });
    }

    if get("hl").as_deref() == Some("true") {
        let hl_fields: Vec<String> = get("hl.fl")
            .map(|fl| fl.split(',').map(|f| f.trim().to_string()).collect())
            .unwrap_or_default();
        let terms = match get("hl.q").or_else(|| state.highlight_default.lock().unwrap().clone()) {
            Some(hl_q) => Clauses::parse(&hl_q).map(|c| c.terms()).unwrap_or_default(),
            None => query.terms(),
        };

        let mut highlighting = Map::new();
        for doc in &page {
            let id = doc.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let mut per_field = Map::new();
            for field in &hl_fields {
                if let Some(snippet) = doc.get(field).and_then(Value::as_str).and_then(|text| highlight(text, &terms)) {
                    per_field.insert(field.clone(), json!([snippet]));
                }
            }
            highlighting.insert(id, Value::Object(per_field));
        }
        body["highlighting"] = Value::Object(highlighting);
    }

    Json(body).into_response()
}

fn check_auth(state: &CollectionState, headers: &HeaderMap) -> Option<Response> {
    let expected = state.basic_auth.lock().unwrap().clone()?;
    let supplied = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    if supplied == Some(expected.as_str()) {
        None
    } else {
        Some(solr_error(StatusCode::UNAUTHORIZED, "require authentication"))
    }
}

fn solr_error(status: StatusCode, msg: &str) -> Response {
    let body = json!({
        "responseHeader": {"status": status.as_u16(), "QTime": 0},
        "error": {
            "metadata": ["error-class", "org.apache.solr.common.SolrException"],
            "msg": msg,
            "code": status.as_u16(),
        },
    });
    (status, Json(body)).into_response()
}

enum Clause {
    All,
    Term { field: String, value: String },
    Field { field: String, value: String },
    Any(String),
}

struct Clauses(Vec<Clause>);

impl Clauses {
    fn parse(q: &str) -> Result<Self, String> {
        let q = q.trim();
        if q.is_empty() || q == "*:*" {
            return Ok(Clauses(vec![Clause::All]));
        }

        if let Some(rest) = q.strip_prefix("{!term f=") {
            let (field, value) = rest
                .split_once('}')
                .ok_or_else(|| format!("org.apache.solr.search.SyntaxError: Cannot parse '{q}'"))?;
            return Ok(Clauses(vec![Clause::Term { field: field.to_string(), value: value.to_string() }]));
        }

        let opens = q.matches(['(', '[']).count();
        let closes = q.matches([')', ']']).count();
        if opens != closes || q.ends_with(':') {
            return Err(format!(
                "org.apache.solr.search.SyntaxError: Cannot parse '{q}': Encountered \"<EOF>\""
            ));
        }

        let clauses = q
            .split_whitespace()
            .filter(|token| !matches!(*token, "OR" | "AND"))
            .map(|token| match token.split_once(':') {
                Some((field, value)) => Clause::Field {
                    field: field.to_string(),
                    value: value.trim_matches('"').to_lowercase(),
                },
                None => Clause::Any(token.trim_matches('"').to_lowercase()),
            })
            .collect();
        Ok(Clauses(clauses))
    }

    fn matches(&self, doc: &Value) -> bool {
        self.0.iter().any(|clause| match clause {
            Clause::All => true,
            Clause::Term { field, value } => field_values(doc, field).iter().any(|v| v == value),
            Clause::Field { field, value } => {
                field_values(doc, field).iter().any(|text| contains_word(text, value))
            },
            Clause::Any(value) => doc
                .as_object()
                .map(|obj| obj.keys().any(|k| field_values(doc, k).iter().any(|t| contains_word(t, value))))
                .unwrap_or(false),
        })
    }

    fn terms(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|clause| match clause {
                Clause::Field { value, .. } | Clause::Any(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

fn field_values(doc: &Value, field: &str) -> Vec<String> {
    match doc.get(field) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect(),
        Some(other) => vec![other.to_string()],
        None => vec![],
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

fn contains_word(text: &str, needle: &str) -> bool {
    match needle.strip_suffix('*') {
        Some(prefix) => words(text).any(|w| w.to_lowercase().starts_with(prefix)),
        None => words(text).any(|w| w.to_lowercase() == needle),
    }
}

fn highlight(text: &str, terms: &[String]) -> Option<String> {
    let mut out = String::new();
    let mut hit = false;
    let mut word = String::new();

    let mut flush = |word: &mut String, out: &mut String| {
        if !word.is_empty() {
            if terms.iter().any(|t| contains_word(word, t)) {
                hit = true;
                out.push_str("<em>");
                out.push_str(word);
                out.push_str("</em>");
            } else {
                out.push_str(word);
            }
            word.clear();
        }
    };

    for c in text.chars() {
        if c.is_alphanumeric() {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);

    hit.then_some(out)
}

fn facet_counts(docs: &[Value], field: &str) -> Vec<Value> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for doc in docs {
        for value in field_values(doc, field) {
            match counts.iter_mut().find(|(v, _)| *v == value) {
                Some((_, n)) => *n += 1,
                None => counts.push((value, 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.into_iter().flat_map(|(v, n)| [json!(v), json!(n)]).collect()
}

fn project(doc: &Value, fl: Option<&str>) -> Value {
    let Some(fl) = fl else { return doc.clone() };
    let wanted: Vec<&str> = fl.split(',').map(str::trim).collect();
    if wanted.contains(&"*") {
        return doc.clone();
    }
    let mut out = Map::new();
    if let Some(obj) = doc.as_object() {
        for (k, v) in obj {
            if wanted.contains(&k.as_str()) {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(out)
}
