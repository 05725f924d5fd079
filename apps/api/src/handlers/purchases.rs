use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use serde_json::Value;

use crate::admin_pages;
use crate::dto::{EventStoredResponse, PurchaseFeedResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Stores a purchase event. The body is parsed as JSON whatever the
/// declared content type.
pub async fn event_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<EventStoredResponse>)> {
    let key = state.purchase_service.ingest(&body).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventStoredResponse {
            ok: true,
            stored: key.file_name(),
            id: key.to_string(),
        }),
    ))
}

pub async fn purchases_json_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let listing = state.purchase_service.listing().await?;

    Ok(Json(
        listing
            .records
            .into_iter()
            .map(|record| record.payload)
            .collect(),
    ))
}

/// Presentation rows for the live page, with the receive time of each
/// purchase.
pub async fn purchases_feed_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PurchaseFeedResponse>> {
    let listing = state.purchase_service.listing().await?;
    Ok(Json(PurchaseFeedResponse::from(&listing)))
}

pub async fn purchases_page_handler(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let listing = state.purchase_service.listing().await?;
    Ok(Html(admin_pages::render_purchases_page(&listing)))
}

pub async fn purchases_live_handler() -> Html<String> {
    Html(admin_pages::render_purchases_live_page())
}
