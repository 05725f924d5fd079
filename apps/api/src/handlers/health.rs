use axum::Json;
use axum::extract::State;
use pokebot_application::StoreSummary;
use tracing::warn;

use crate::dto::{HealthResponse, RootResponse, format_timestamp};
use crate::state::AppState;

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        ok: true,
        msg: "PokeBot webhook receiver is running",
    })
}

/// Always answers 200. Storage statistics are best-effort and fall back to
/// empty values when a directory cannot be read.
pub async fn healthz_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let decisions = state
        .decision_service
        .summary()
        .await
        .unwrap_or_else(|error| {
            warn!(%error, "decision summary unavailable");
            StoreSummary::default()
        });
    let purchases = state
        .purchase_service
        .summary()
        .await
        .unwrap_or_else(|error| {
            warn!(%error, "purchase summary unavailable");
            StoreSummary::default()
        });

    Json(HealthResponse {
        ok: true,
        decisions_count: decisions.count,
        purchases_count: purchases.count,
        latest_decision_ts: decisions.latest_modified_at.map(format_timestamp),
        latest_purchase_ts: purchases.latest_modified_at.map(format_timestamp),
    })
}
