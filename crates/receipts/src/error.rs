use common::LineId;
use thiserror::Error;

/// Errors that can occur on the receipt read path.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The date query parameter was not a `YYYY-MM-DD` calendar day.
    #[error("Invalid date format: {0}. Use YYYY-MM-DD.")]
    InvalidDateFilter(String),

    /// No sale line exists with the given id.
    #[error("Sale line not found: {0}")]
    LineNotFound(LineId),

    /// The store failed while reading.
    #[error("Storage failure: {0}")]
    Store(#[from] store::StoreError),
}

/// Result type for receipt queries.
pub type Result<T> = std::result::Result<T, ReceiptError>;
