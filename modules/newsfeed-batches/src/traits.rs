// PageSource is the seam between the batch generator and the network.
//
// NytClient implements it for real runs; MockPages (testing.rs) replays a
// scripted list of outcomes so the generator can be tested without HTTP.

use async_trait::async_trait;

use nytimes_client::{NytClient, PageOutcome, PageRequest};

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page. Failures come back as `PageOutcome` variants, never as
    /// errors.
    async fn fetch_page(&self, request: &PageRequest) -> PageOutcome;
}

#[async_trait]
impl PageSource for NytClient {
    async fn fetch_page(&self, request: &PageRequest) -> PageOutcome {
        self.search_page(request).await
    }
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for &T {
    async fn fetch_page(&self, request: &PageRequest) -> PageOutcome {
        (**self).fetch_page(request).await
    }
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Box<T> {
    async fn fetch_page(&self, request: &PageRequest) -> PageOutcome {
        (**self).fetch_page(request).await
    }
}
