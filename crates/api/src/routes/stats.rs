//! Dashboard stats endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;
use store::{DateWindow, RetailStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(rename = "totalStock")]
    pub total_stock: i64,
    #[serde(rename = "todaysSales")]
    pub todays_sales: f64,
}

/// GET /stats — total stock on hand and today's sales (UTC day).
#[tracing::instrument(skip(state))]
pub async fn get<S: RetailStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let total_stock = state.store.total_stock().await?;

    let today = DateWindow::for_day(Utc::now().date_naive())
        .ok_or_else(|| ApiError::Internal("current day out of calendar range".to_string()))?;
    let todays_sales = state
        .store
        .sales_total_between(today.start, today.end)
        .await?;

    Ok(Json(StatsResponse {
        total_stock,
        todays_sales: todays_sales.as_dollars(),
    }))
}
