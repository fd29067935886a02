use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::NytError;
use crate::{ARTICLE_SEARCH_API, ARTICLE_SEARCH_ENDPOINT, DEFAULT_BASE_URL};

/// Connection settings for [`crate::NytClient`].
#[derive(Debug, Clone)]
pub struct NytConfig {
    pub api_key: String,
    /// Prefix every request URL starts with, e.g. `https://api.nytimes.com/svc/`.
    pub base_url: String,
    pub article_search_api: String,
    pub article_search_endpoint: String,
    pub timeout: Duration,
}

impl NytConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            article_search_api: ARTICLE_SEARCH_API.to_string(),
            article_search_endpoint: ARTICLE_SEARCH_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parameters for one Article Search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Optional free-text filter, sent as `q`.
    pub query: Option<String>,
}

impl PageRequest {
    pub fn new(page: u32, query: Option<&str>) -> Self {
        Self {
            page,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string())];
        if let Some(q) = &self.query {
            params.push(("q", q.clone()));
        }
        params
    }
}

/// Article Search response envelope: `{"response": {"docs": [...]}}`.
/// Anything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub response: Option<SearchBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub docs: Vec<Value>,
}

impl SearchResponse {
    pub fn into_docs(self) -> Vec<Value> {
        self.response.map(|body| body.docs).unwrap_or_default()
    }
}

/// What one page request produced. Requesting a page never fails outright;
/// transport and API failures are reported here instead.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// One or more raw documents.
    Docs(Vec<Value>),
    /// The request succeeded but the page held no documents.
    Exhausted,
    /// The API answered 429.
    RateLimited { retry_after: Option<Duration> },
    /// Any other failure.
    Failed(NytError),
}

impl PageOutcome {
    pub fn from_docs(docs: Vec<Value>) -> Self {
        if docs.is_empty() {
            PageOutcome::Exhausted
        } else {
            PageOutcome::Docs(docs)
        }
    }

    /// True when the page contributed no documents, whatever the reason.
    pub fn is_empty(&self) -> bool {
        !matches!(self, PageOutcome::Docs(_))
    }
}
