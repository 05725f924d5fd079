use axum::extract::{MatchedPath, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

/// Rejects requests without the configured admin credentials. Passes
/// everything through when no credentials are configured.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if let Some(credentials) = &state.admin_credentials {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if let Err(error) = credentials.verify(authorization) {
            debug!(path = request.uri().path(), %error, "admin request rejected");
            return Err(error.into());
        }
    }

    Ok(next.run(request).await)
}

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH_LABEL: &str = "<unmatched>";

/// Counts every finished request by method, route template and status.
pub async fn record_http_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_PATH_LABEL, MatchedPath::as_str)
        .to_owned();

    let response = next.run(request).await;

    state
        .metrics_service
        .record_http_request(method, path, response.status().as_u16())
        .await;

    response
}
