// Test doubles for the batch generator.
//
// - MockPages (PageSource): replays scripted PageOutcomes in request order and
//   records every PageRequest it saw.
// - docs(): well-formed Article Search documents with ids `doc-<n>`.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use nytimes_client::{NytError, PageOutcome, PageRequest};

use crate::traits::PageSource;

/// Scripted page source. Each request consumes the next outcome; once the
/// script runs out every request is answered with `Exhausted`.
pub struct MockPages {
    script: Mutex<VecDeque<PageOutcome>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockPages {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Build from page sizes: `from_sizes(&[3, 0])` scripts a page of three
    /// docs followed by an empty page. Doc ids continue across pages.
    pub fn from_sizes(sizes: &[usize]) -> Self {
        let mut next = 0;
        sizes.iter().fold(Self::new(), |mock, &size| {
            let start = next;
            next += size;
            mock.then(PageOutcome::from_docs(docs(start..next)))
        })
    }

    pub fn then(self, outcome: PageOutcome) -> Self {
        self.script
            .lock()
            .expect("mock script poisoned")
            .push_back(outcome);
        self
    }

    pub fn page(self, docs: Vec<Value>) -> Self {
        self.then(PageOutcome::from_docs(docs))
    }

    pub fn empty_page(self) -> Self {
        self.then(PageOutcome::Exhausted)
    }

    pub fn rate_limited(self) -> Self {
        self.then(PageOutcome::RateLimited { retry_after: None })
    }

    pub fn rate_limited_for(self, retry_after: Duration) -> Self {
        self.then(PageOutcome::RateLimited {
            retry_after: Some(retry_after),
        })
    }

    pub fn failure(self, err: NytError) -> Self {
        self.then(PageOutcome::Failed(err))
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().expect("mock requests poisoned").clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requests().iter().map(|r| r.page).collect()
    }
}

impl Default for MockPages {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for MockPages {
    async fn fetch_page(&self, request: &PageRequest) -> PageOutcome {
        self.requests
            .lock()
            .expect("mock requests poisoned")
            .push(request.clone());
        self.script
            .lock()
            .expect("mock script poisoned")
            .pop_front()
            .unwrap_or(PageOutcome::Exhausted)
    }
}

/// A well-formed Article Search document.
pub fn doc(n: usize) -> Value {
    json!({
        "abstract": format!("Abstract {n}"),
        "web_url": format!("https://www.nytimes.com/2024/01/05/technology/doc-{n}.html"),
        "headline": {"main": format!("Headline {n}"), "kicker": null},
        "byline": {"original": "By Staff", "person": []},
        "_id": format!("doc-{n}"),
        "pub_date": "2024-01-05T10:00:05+0000",
        "keywords": [{"name": "subject", "value": "Technology"}]
    })
}

pub fn docs(range: Range<usize>) -> Vec<Value> {
    range.map(doc).collect()
}
