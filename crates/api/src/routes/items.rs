//! Catalogue item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ItemId, Money};
use serde::{Deserialize, Serialize};
use store::{ItemRecord, ItemUpdate, NewItem, RetailStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub quantity: i64,
    pub buying_price: f64,
    pub selling_price: f64,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

impl ItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name cannot be blank".to_string()));
        }
        if self.quantity < 0 {
            return Err(ApiError::BadRequest(
                "Quantity cannot be negative".to_string(),
            ));
        }
        if self.buying_price < 0.0 || self.selling_price < 0.0 {
            return Err(ApiError::BadRequest(
                "Prices cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub buying_price: f64,
    pub selling_price: f64,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

impl From<ItemRecord> for ItemResponse {
    fn from(item: ItemRecord) -> Self {
        Self {
            id: item.id.as_i64(),
            name: item.name,
            quantity: item.quantity,
            buying_price: item.buying_price.as_dollars(),
            selling_price: item.selling_price.as_dollars(),
            barcode: item.barcode,
            supplier_id: item.supplier_id,
        }
    }
}

/// GET /items — the whole catalogue.
#[tracing::instrument(skip(state))]
pub async fn list<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.store.list_items().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /items — create a catalogue item.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ItemRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    req.validate()?;

    if let Some(ref barcode) = req.barcode
        && state.store.find_item_by_barcode(barcode).await?.is_some()
    {
        return Err(ApiError::BadRequest(format!(
            "Barcode {barcode} already exists"
        )));
    }

    let item = state
        .store
        .insert_item(NewItem {
            name: req.name,
            quantity: req.quantity,
            buying_price: Money::from_dollars(req.buying_price),
            selling_price: Money::from_dollars(req.selling_price),
            barcode: req.barcode,
            supplier_id: req.supplier_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Item created successfully.",
            "id": item.id.as_i64(),
        })),
    ))
}

/// GET /items/{id} — one catalogue item.
#[tracing::instrument(skip(state))]
pub async fn get<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .store
        .get_item(ItemId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    Ok(Json(item.into()))
}

/// PUT /items/{id} — full update, including direct quantity corrections.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let updated = state
        .store
        .update_item(
            ItemId::new(id),
            ItemUpdate {
                name: req.name,
                quantity: req.quantity,
                buying_price: Money::from_dollars(req.buying_price),
                selling_price: Money::from_dollars(req.selling_price),
                barcode: req.barcode,
                supplier_id: req.supplier_id,
            },
        )
        .await?;

    if updated.is_none() {
        return Err(ApiError::NotFound(format!("Item {id} not found")));
    }
    Ok(Json(serde_json::json!({
        "message": "Item updated successfully."
    })))
}

/// DELETE /items/{id} — remove an item; receipt reads tolerate the
/// dangling lines left behind.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_item(ItemId::new(id)).await? {
        return Err(ApiError::NotFound(format!("Item {id} not found")));
    }
    Ok(Json(serde_json::json!({ "message": "Item deleted." })))
}

/// GET /items/barcode/{code} — scanner lookup for the sell screen.
#[tracing::instrument(skip(state))]
pub async fn by_barcode<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .store
        .find_item_by_barcode(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No item with barcode {code}")))?;
    Ok(Json(item.into()))
}
