//! Supplier endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use store::{NewSupplier, RetailStore, SupplierRecord};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct SupplierResponse {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
}

impl From<SupplierRecord> for SupplierResponse {
    fn from(supplier: SupplierRecord) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name,
            contact: supplier.contact,
            email: supplier.email,
        }
    }
}

/// GET /suppliers — all suppliers.
#[tracing::instrument(skip(state))]
pub async fn list<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<SupplierResponse>>, ApiError> {
    let suppliers = state.store.list_suppliers().await?;
    Ok(Json(
        suppliers.into_iter().map(SupplierResponse::from).collect(),
    ))
}

/// POST /suppliers — create a supplier; names are unique.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SupplierRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be blank".to_string()));
    }
    if state.store.find_supplier_by_name(&req.name).await?.is_some() {
        return Err(ApiError::BadRequest("Supplier already exists".to_string()));
    }

    let supplier = state
        .store
        .insert_supplier(NewSupplier {
            name: req.name,
            contact: req.contact,
            email: req.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Supplier created",
            "supplier": { "id": supplier.id, "name": supplier.name },
        })),
    ))
}
