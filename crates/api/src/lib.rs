//! HTTP API server with observability for the retail back-office.
//!
//! Exposes the sale transaction engine (`/transactions`), the catalogue
//! (`/items`, `/suppliers`), user accounts (`/register`, `/login`) and the
//! dashboard (`/stats`), with structured logging (tracing) and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use ledger::LedgerService;
use metrics_exporter_prometheus::PrometheusHandle;
use receipts::ReceiptQueryService;
use store::RetailStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RetailStore> {
    pub store: S,
    pub ledger: LedgerService<S>,
    pub receipts: ReceiptQueryService<S>,
    pub jwt_secret: String,
}

/// Builds application state around one store backend.
pub fn create_state<S: RetailStore + Clone + 'static>(store: S, config: &Config) -> Arc<AppState<S>> {
    let ledger = LedgerService::new(store.clone())
        .with_commit_timeout(Duration::from_millis(config.commit_timeout_ms));
    let receipts = ReceiptQueryService::new(store.clone());
    Arc::new(AppState {
        store,
        ledger,
        receipts,
        jwt_secret: config.jwt_secret.clone(),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RetailStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/transactions",
            post(routes::transactions::create::<S>).get(routes::transactions::list::<S>),
        )
        .route(
            "/transactions/{id}",
            get(routes::transactions::get::<S>).delete(routes::transactions::delete::<S>),
        )
        .route(
            "/items",
            get(routes::items::list::<S>).post(routes::items::create::<S>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S>)
                .put(routes::items::update::<S>)
                .delete(routes::items::delete::<S>),
        )
        .route("/items/barcode/{code}", get(routes::items::by_barcode::<S>))
        .route(
            "/suppliers",
            get(routes::suppliers::list::<S>).post(routes::suppliers::create::<S>),
        )
        .route("/register", post(routes::users::register::<S>))
        .route("/login", post(routes::users::login::<S>))
        .route("/stats", get(routes::stats::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
