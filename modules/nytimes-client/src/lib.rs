pub mod error;
pub mod types;

pub use error::{NytError, Result};
pub use types::{NytConfig, PageOutcome, PageRequest, SearchBody, SearchResponse};

use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com/svc/";

/// API section for Article Search.
pub const ARTICLE_SEARCH_API: &str = "search/v2/";

pub const ARTICLE_SEARCH_ENDPOINT: &str = "articlesearch.json";

/// HTTP client plus the credential attached to every request.
struct Session {
    http: reqwest::Client,
    api_key: String,
}

/// Client for the NYT Article Search API.
///
/// The underlying session is built on first use and reused afterwards. One
/// client serves one fetch stream; it is not meant to be shared across
/// concurrent paginations.
pub struct NytClient {
    config: NytConfig,
    session: OnceCell<Session>,
}

impl NytClient {
    pub fn new(config: NytConfig) -> Self {
        Self {
            config,
            session: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &NytConfig {
        &self.config
    }

    async fn session(&self) -> Result<&Session> {
        self.session
            .get_or_try_init(|| async {
                tracing::info!(timeout_secs = self.config.timeout.as_secs(), "Creating NYT API session");
                let http = reqwest::Client::builder()
                    .timeout(self.config.timeout)
                    .build()?;
                Ok::<_, NytError>(Session {
                    http,
                    api_key: self.config.api_key.clone(),
                })
            })
            .await
    }

    /// Send one GET to `<base_url><api><endpoint>` and decode the JSON body.
    pub async fn get(&self, api: &str, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}{}", self.config.base_url, api, endpoint);
        tracing::debug!(%url, ?params, "Sending NYT request");

        let session = self.session().await?;
        let resp = session
            .http
            .get(&url)
            .query(&[("api-key", session.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(NytError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NytError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        tracing::debug!(%url, "NYT request succeeded");
        Ok(value)
    }

    /// Fetch one Article Search page. Never returns an error: failures are
    /// logged and reported as a [`PageOutcome`] variant.
    pub async fn search_page(&self, request: &PageRequest) -> PageOutcome {
        let result = self
            .get(
                &self.config.article_search_api,
                &self.config.article_search_endpoint,
                &request.query_params(),
            )
            .await
            .and_then(|body| serde_json::from_value::<SearchResponse>(body).map_err(NytError::from));

        match result {
            Ok(response) => {
                let docs = response.into_docs();
                tracing::info!(page = request.page, docs = docs.len(), "Fetched article search page");
                PageOutcome::from_docs(docs)
            }
            Err(NytError::RateLimited { retry_after }) => {
                tracing::warn!(
                    page = request.page,
                    retry_after_secs = retry_after.map(|d| d.as_secs()),
                    "Too many requests, got a 429 from NYT"
                );
                PageOutcome::RateLimited { retry_after }
            }
            Err(err) => {
                tracing::error!(page = request.page, error = %err, "NYT article search request failed");
                PageOutcome::Failed(err)
            }
        }
    }
}
