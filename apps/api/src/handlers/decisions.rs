use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::{Form, Json};
use pokebot_application::InboundOutcome;
use pokebot_core::AppError;
use pokebot_domain::InboundEmail;

use crate::admin_pages;
use crate::dto::{DecisionListResponse, DecisionLookupResponse, InboundResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Accepts an inbound parse post, either url-encoded or multipart.
pub async fn inbound_handler(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<InboundResponse>> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase());

    let email = if content_type.is_none() {
        // No declared body is read as an empty form.
        InboundEmail::default()
    } else if content_type
        .as_deref()
        .is_some_and(|value| value.starts_with("multipart/form-data"))
    {
        read_multipart_email(request).await?
    } else {
        let Form(email) = Form::<InboundEmail>::from_request(request, &())
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        email
    };

    let response = match state.decision_service.record_inbound(&email).await? {
        InboundOutcome::Stored(record) => InboundResponse::Stored {
            ok: true,
            stored: record,
        },
        InboundOutcome::Rejected(rejection) => InboundResponse::Rejected {
            ok: false,
            error: rejection.message(),
        },
    };

    Ok(Json(response))
}

async fn read_multipart_email(request: Request) -> Result<InboundEmail, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let mut email = InboundEmail::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::Validation(error.body_text()))?
    {
        // Attachments are ignored.
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let slot = match name.as_str() {
            "from" => &mut email.from,
            "to" => &mut email.to,
            "subject" => &mut email.subject,
            "text" => &mut email.text,
            "html" => &mut email.html,
            _ => continue,
        };
        *slot = field
            .text()
            .await
            .map_err(|error| AppError::Validation(error.body_text()))?;
    }

    Ok(email)
}

pub async fn decision_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<DecisionLookupResponse>> {
    let response = match state.decision_service.find(&token).await? {
        Some(record) => DecisionLookupResponse {
            ok: true,
            status: "found",
            data: Some(record),
        },
        None => DecisionLookupResponse {
            ok: false,
            status: "pending",
            data: None,
        },
    };

    Ok(Json(response))
}

pub async fn decisions_json_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<DecisionListResponse>> {
    let items = state.decision_service.list_recent().await?;
    Ok(Json(DecisionListResponse { ok: true, items }))
}

pub async fn decisions_page_handler(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let items = state.decision_service.list_recent().await?;
    Ok(Html(admin_pages::render_decisions_page(&items)))
}

pub async fn decisions_live_handler() -> Html<String> {
    Html(admin_pages::render_decisions_live_page())
}
