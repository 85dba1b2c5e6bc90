//! Prometheus metrics endpoint.
//!
//! Renders whatever the installed recorder has gathered, which here means
//! the ledger counters (`ledger_sales_total`, `ledger_rollbacks_total`,
//! ...), the sale duration histogram, and the api request counters.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — the back-office metrics in Prometheus text format.
pub async fn render(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
}
