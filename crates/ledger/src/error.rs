use common::{ItemId, LineId};
use thiserror::Error;

/// Errors that can occur while recording or deleting sales.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The sale request carried no line items.
    #[error("Receipt has no line items")]
    EmptyReceipt,

    /// A line item requested a non-positive quantity.
    #[error("Invalid quantity {quantity} for item {item_id} (must be greater than 0)")]
    InvalidQuantity { item_id: ItemId, quantity: i64 },

    /// A line item referenced an item that does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// An item does not have enough stock to cover the requested quantity.
    #[error("Not enough stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: i64,
        available: i64,
    },

    /// No sale line exists with the given id.
    #[error("Sale line not found: {0}")]
    LineNotFound(LineId),

    /// The store failed or timed out mid-commit. All mutations made during
    /// the call have been rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<store::StoreError> for LedgerError {
    fn from(err: store::StoreError) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
