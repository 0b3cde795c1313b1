use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::headers::{request_id, security_headers};
use crate::AppState;

pub mod handlers;

/// Build the HTTP router over the shared store.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Health endpoint (never touches the store)
        .route("/healthcheck", get(handlers::healthcheck))
        .route(
            "/",
            get(handlers::missing_id)
                .head(handlers::method_not_allowed)
                .post(handlers::save_secret),
        )
        // HEAD would consume the secret without returning it.
        .route(
            "/:id",
            get(handlers::consume_secret).head(handlers::method_not_allowed),
        )
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
}
