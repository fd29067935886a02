//! Fixed-size article batches over a paginated search.
//!
//! [`ArticleBatches`] asks its [`PageSource`] for page 0, 1, 2, ... and regroups
//! the returned documents into batches of exactly `batch_size` articles, no
//! matter how the API sizes its pages. Pages are fetched only when the buffer
//! cannot fill the next batch. The run ends at the first page that produces no
//! articles; whatever is still buffered is then yielded as one short batch.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use futures::Stream;
use tracing::{debug, info, warn};

use newsfeed_common::Article;
use nytimes_client::{NytClient, PageOutcome, PageRequest};

use crate::error::BatchError;
use crate::traits::PageSource;

/// An ordered group of at most `batch_size` articles.
pub type Batch = Vec<Article>;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub query: Option<String>,
    /// Stop after this many pages have been consumed.
    pub max_pages: Option<u32>,
    /// Pause before every page request after the first.
    pub page_delay: Duration,
    /// How many times one page is re-requested after a 429. Zero ends the run
    /// on the first 429.
    pub rate_limit_retries: u32,
    /// Wait before a retry when the server sent no `Retry-After`.
    pub rate_limit_backoff: Duration,
}

impl BatchOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            query: None,
            max_pages: None,
            page_delay: Duration::ZERO,
            rate_limit_retries: 0,
            rate_limit_backoff: Duration::from_secs(12),
        }
    }

    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_rate_limit_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.rate_limit_retries = retries;
        self.rate_limit_backoff = backoff;
        self
    }
}

/// Why a run stopped requesting pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The API returned a page with no documents.
    Exhausted { page: u32 },
    /// `max_pages` pages were consumed.
    PageLimit { pages: u32 },
    /// A 429 that was not (or no longer) retried.
    RateLimited { page: u32 },
    /// Any other request failure.
    Failed {
        page: u32,
        fatal: bool,
        message: String,
    },
    /// Every document on the page was malformed.
    Unusable { page: u32, skipped: usize },
}

impl Termination {
    /// True when the run reached the end of the data rather than being cut
    /// short by an error.
    pub fn is_clean(&self) -> bool {
        matches!(self, Termination::Exhausted { .. } | Termination::PageLimit { .. })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted { page } => write!(f, "no more articles after page {page}"),
            Termination::PageLimit { pages } => write!(f, "page limit of {pages} reached"),
            Termination::RateLimited { page } => write!(f, "rate limited on page {page}"),
            Termination::Failed {
                page,
                fatal,
                message,
            } => {
                let kind = if *fatal { "fatal error" } else { "error" };
                write!(f, "{kind} on page {page}: {message}")
            }
            Termination::Unusable { page, skipped } => {
                write!(f, "all {skipped} documents on page {page} were malformed")
            }
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub requests: u32,
    pub pages: u32,
    pub articles: usize,
    pub batches: usize,
    pub skipped_docs: usize,
    pub rate_limit_retries: u32,
}

/// Lazy, finite, non-restartable sequence of article batches.
pub struct ArticleBatches<S> {
    source: S,
    options: BatchOptions,
    page: u32,
    buffer: VecDeque<Article>,
    termination: Option<Termination>,
    stats: FeedStats,
}

/// Batches over NYT Article Search, optionally filtered by `query`.
pub fn get_articles(
    client: NytClient,
    batch_size: usize,
    query: Option<&str>,
) -> Result<ArticleBatches<NytClient>, BatchError> {
    ArticleBatches::new(client, BatchOptions::new(batch_size).with_query(query))
}

impl<S: PageSource> ArticleBatches<S> {
    pub fn new(source: S, options: BatchOptions) -> Result<Self, BatchError> {
        if options.batch_size == 0 {
            return Err(BatchError::InvalidBatchSize(options.batch_size));
        }
        info!(
            batch_size = options.batch_size,
            query = options.query.as_deref(),
            "Getting articles"
        );
        Ok(Self {
            source,
            options,
            page: 0,
            buffer: VecDeque::new(),
            termination: None,
            stats: FeedStats::default(),
        })
    }

    /// Next batch, or `None` once the run is over. Every batch holds exactly
    /// `batch_size` articles except the last one, which may be shorter.
    pub async fn next_batch(&mut self) -> Option<Batch> {
        loop {
            let batch_size = self.options.batch_size;
            if self.buffer.len() >= batch_size {
                return Some(self.take(batch_size));
            }
            if self.termination.is_some() {
                if self.buffer.is_empty() {
                    return None;
                }
                let remaining = self.buffer.len();
                return Some(self.take(remaining));
            }
            self.fetch_next_page().await;
        }
    }

    /// Set once no further pages will be requested.
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Index of the next page to request.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Adapt into a `Stream` of batches. The termination reason is not
    /// observable through the stream; use `next_batch` when it matters.
    pub fn into_stream(self) -> impl Stream<Item = Batch> {
        futures::stream::unfold(self, |mut batches| async move {
            match batches.next_batch().await {
                Some(batch) => Some((batch, batches)),
                None => None,
            }
        })
    }

    fn take(&mut self, n: usize) -> Batch {
        let batch: Batch = self.buffer.drain(..n).collect();
        self.stats.batches += 1;
        self.stats.articles += batch.len();
        debug!(size = batch.len(), buffered = self.buffer.len(), "Yielding batch");
        batch
    }

    async fn fetch_next_page(&mut self) {
        if let Some(max) = self.options.max_pages {
            if self.page >= max {
                self.finish(Termination::PageLimit { pages: max });
                return;
            }
        }
        if self.page > 0 && !self.options.page_delay.is_zero() {
            tokio::time::sleep(self.options.page_delay).await;
        }

        let page = self.page;
        let request = PageRequest::new(page, self.options.query.as_deref());
        let mut retries_left = self.options.rate_limit_retries;

        let docs = loop {
            self.stats.requests += 1;
            let outcome = self.source.fetch_page(&request).await;
            match outcome {
                PageOutcome::Docs(docs) => break docs,
                PageOutcome::Exhausted => {
                    self.finish(Termination::Exhausted { page });
                    return;
                }
                PageOutcome::RateLimited { retry_after } if retries_left > 0 => {
                    retries_left -= 1;
                    self.stats.rate_limit_retries += 1;
                    let wait = retry_after.unwrap_or(self.options.rate_limit_backoff);
                    warn!(
                        page,
                        wait_secs = wait.as_secs_f64(),
                        retries_left,
                        "Rate limited, retrying page"
                    );
                    if !wait.is_zero() {
                        tokio::time::sleep(wait).await;
                    }
                }
                PageOutcome::RateLimited { .. } => {
                    self.finish(Termination::RateLimited { page });
                    return;
                }
                PageOutcome::Failed(err) => {
                    self.finish(Termination::Failed {
                        page,
                        fatal: err.is_fatal(),
                        message: err.to_string(),
                    });
                    return;
                }
            }
        };

        let received = docs.len();
        let mut articles = Vec::with_capacity(received);
        for doc in docs {
            match Article::from_doc(doc) {
                Ok(article) => articles.push(article),
                Err(err) => {
                    self.stats.skipped_docs += 1;
                    warn!(page, error = %err, "Skipping malformed document");
                }
            }
        }

        if articles.is_empty() {
            self.finish(Termination::Unusable {
                page,
                skipped: received,
            });
            return;
        }

        self.stats.pages += 1;
        self.buffer.extend(articles);
        debug!(page, received, buffered = self.buffer.len(), "Buffered page");
        self.page += 1;
    }

    fn finish(&mut self, termination: Termination) {
        if termination.is_clean() {
            info!(%termination, buffered = self.buffer.len(), "There are no more articles");
        } else {
            warn!(%termination, buffered = self.buffer.len(), "Article feed aborted");
        }
        self.termination = Some(termination);
    }
}
