pub mod batches;
pub mod error;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batches::{get_articles, ArticleBatches, Batch, BatchOptions, FeedStats, Termination};
pub use error::BatchError;
pub use traits::PageSource;
