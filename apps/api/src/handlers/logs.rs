use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use pokebot_domain::render_text_line;

use crate::dto::LogsQuery;
use crate::error::ApiResult;
use crate::state::AppState;

const JSON_LINES_CONTENT_TYPE: &str = "application/x-ndjson";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Tails the operation log, oldest line first.
pub async fn logs_handler(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Response> {
    let lines = state.operation_log_service.tail(query.line_count()).await?;

    let (content_type, lines) = if query.wants_text() {
        (
            TEXT_CONTENT_TYPE,
            lines.iter().map(|line| render_text_line(line)).collect::<Vec<_>>(),
        )
    } else {
        (JSON_LINES_CONTENT_TYPE, lines)
    };

    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }

    Ok(([(CONTENT_TYPE, content_type)], body).into_response())
}
