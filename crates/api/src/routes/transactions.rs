//! Sale recording and receipt query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ItemId, LineId};
use ledger::{SaleLine, SaleRequest};
use receipts::{LineDetailView, ReceiptView};
use serde::{Deserialize, Serialize};
use store::RetailStore;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct RecordSaleRequest {
    pub payment_method: Option<String>,
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

/// One requested line. Both fields are checked in the handler so an
/// incomplete entry reports as a bad request rather than a body-decode
/// rejection.
#[derive(Debug, Deserialize)]
pub struct SaleLineRequest {
    pub item_id: Option<i64>,
    pub quantity_sold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub date: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReceiptResponse {
    pub transaction_id: String,
    pub date: String,
    pub payment_method: String,
    pub customer_name: String,
    pub transactions: Vec<ReceiptLineResponse>,
}

#[derive(Serialize)]
pub struct ReceiptLineResponse {
    pub item_id: i64,
    pub item_name: String,
    pub quantity_sold: i64,
    pub total_price: f64,
}

// -- Handlers --

/// POST /transactions — record a grouped sale.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RecordSaleRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>), ApiError> {
    metrics::counter!("api_sale_requests_total").increment(1);

    let mut lines = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let (Some(item_id), Some(quantity_sold)) = (line.item_id, line.quantity_sold) else {
            return Err(ApiError::BadRequest(
                "Each item needs an item_id and a quantity_sold".to_string(),
            ));
        };
        lines.push(SaleLine {
            item_id: ItemId::new(item_id),
            quantity_sold,
        });
    }

    let request = SaleRequest {
        payment_method: req.payment_method,
        customer_name: req.customer_name,
        lines,
    };

    let receipt = state.ledger.record_sale(request).await?;

    let response = ReceiptResponse {
        transaction_id: receipt.receipt_id.to_string(),
        date: receipt.date.to_rfc3339(),
        payment_method: receipt.payment_method,
        customer_name: receipt.customer_name,
        transactions: receipt
            .lines
            .into_iter()
            .map(|line| ReceiptLineResponse {
                item_id: line.item_id.as_i64(),
                item_name: line.item_name,
                quantity_sold: line.quantity_sold,
                total_price: line.total_price.as_dollars(),
            })
            .collect(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /transactions?date=YYYY-MM-DD — list receipts, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReceiptView>>, ApiError> {
    let receipts = state.receipts.list_receipts(params.date.as_deref()).await?;
    Ok(Json(receipts))
}

/// GET /transactions/{id} — one sale line with its receipt metadata.
#[tracing::instrument(skip(state))]
pub async fn get<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<LineDetailView>, ApiError> {
    let detail = state.receipts.get_line(LineId::new(id)).await?;
    Ok(Json(detail))
}

/// DELETE /transactions/{id} — delete a sale line (never restocks).
#[tracing::instrument(skip(state))]
pub async fn delete<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ledger.delete_line(LineId::new(id)).await?;
    Ok(Json(serde_json::json!({ "message": "Transaction deleted." })))
}
