use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::state::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics_service.snapshot().await;
    (
        [(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        snapshot.to_prometheus_text(),
    )
}
