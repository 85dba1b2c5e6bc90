//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::LedgerError;
use receipts::ReceiptError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Ledger (write-side) error.
    Ledger(LedgerError),
    /// Receipt query (read-side) error.
    Receipt(ReceiptError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Receipt(err) => receipt_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        // Caller errors, detected before any mutation.
        LedgerError::EmptyReceipt
        | LedgerError::InvalidQuantity { .. }
        | LedgerError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::ItemNotFound(_) | LedgerError::LineNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        // Already rolled back by the ledger; surface with the message.
        LedgerError::Persistence(_) => {
            tracing::error!(error = %err, "persistence failure surfaced to client");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn receipt_error_to_response(err: ReceiptError) -> (StatusCode, String) {
    match &err {
        ReceiptError::InvalidDateFilter(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        ReceiptError::LineNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ReceiptError::Store(_) => {
            tracing::error!(error = %err, "store failure surfaced to client");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        ApiError::Receipt(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
