// Store error types

use thiserror::Error;

/// Errors surfaced by `RecordStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the requested id exists.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backing file could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The backing file exists but does not hold a valid collection.
    #[error("storage corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error identifies a missing record rather than a
    /// storage failure.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
