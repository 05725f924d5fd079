use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

/// Inbound parse posts carry whole emails, attachments included.
pub const INBOUND_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/purchases.json",
            get(handlers::purchases::purchases_json_handler),
        )
        .route(
            "/admin/purchases",
            get(handlers::purchases::purchases_page_handler),
        )
        .route(
            "/admin/purchases/feed",
            get(handlers::purchases::purchases_feed_handler),
        )
        .route(
            "/admin/purchases/live",
            get(handlers::purchases::purchases_live_handler),
        )
        .route(
            "/decisions.json",
            get(handlers::decisions::decisions_json_handler),
        )
        .route("/admin", get(handlers::decisions::decisions_page_handler))
        .route(
            "/admin/live",
            get(handlers::decisions::decisions_live_handler),
        )
        .route("/admin/logs", get(handlers::logs::logs_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/", get(handlers::health::root_handler))
        .route("/healthz", get(handlers::health::healthz_handler))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .route("/event", post(handlers::purchases::event_handler))
        .route(
            "/inbound",
            post(handlers::decisions::inbound_handler)
                .layer(DefaultBodyLimit::max(INBOUND_BODY_LIMIT)),
        )
        .route(
            "/decision/{token}",
            get(handlers::decisions::decision_handler),
        )
        .merge(admin_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::record_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
