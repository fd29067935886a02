use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),
}
