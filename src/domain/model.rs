use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Written in place of any facet the API left out.
pub const PLACEHOLDER: &str = "-";

/// A domain or IP submitted to the passive DNS API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(indicator: impl Into<String>) -> Self {
        Self(indicator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Console-safe rendering: `example.com` becomes `example(.)com`.
    pub fn defanged(&self) -> String {
        self.0.replace('.', "(.)")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token naming the next page of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads `pager.next`. A falsy pager or a falsy `next` means the result set is exhausted.
    pub fn from_pager(pager: &Value) -> Option<Self> {
        let next = pager.as_object()?.get("next")?;
        match next {
            Value::String(token) if !token.is_empty() => Some(Self(token.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

/// One historical DNS answer, flattened to the all-resolutions CSV layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionRecord {
    #[serde(rename = "Domain")]
    pub value: String,
    #[serde(rename = "Resolution")]
    pub resolve: String,
    #[serde(rename = "First Seen")]
    pub first_seen: String,
    #[serde(rename = "Last Seen")]
    pub last_seen: String,
    #[serde(rename = "Collected")]
    pub collected: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Record Hash")]
    pub record_hash: String,
}

/// How often one IP was observed for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRecord {
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Frequency")]
    pub frequency: u64,
}

/// Records gathered for a single query across every page fetched.
#[derive(Debug, Clone)]
pub struct ResultSet<R> {
    pub query: Query,
    pub records: Vec<R>,
    pub pages: usize,
    /// Set when a later page failed and only part of the result set arrived.
    pub truncated_by: Option<FetchFailure>,
}

impl<R> ResultSet<R> {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            records: Vec::new(),
            pages: 0,
            truncated_by: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.truncated_by.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Status(u16),
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {}", code),
            FetchFailure::Transport(reason) => write!(f, "request failed: {}", reason),
        }
    }
}

/// Outcome of paging through one query.
#[derive(Debug)]
pub enum Extraction<R> {
    Collected(ResultSet<R>),
    /// The very first request failed; nothing is written for this query.
    Abandoned { query: Query, failure: FetchFailure },
}

/// Response-level metadata printed once per query, from the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    pub lines: Vec<(&'static str, String)>,
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "-".repeat(self.title.chars().count()))?;
        for (label, value) in &self.lines {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

/// Renders a JSON facet as CSV text; `None` and `null` become the placeholder.
pub fn facet_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
