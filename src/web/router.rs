//! Router configuration for the web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{download, get_tree, media, post_action, AppState};

/// Create the API router.
///
/// `max_request_bytes` caps the body of `POST /api/action`.
pub fn create_router(app_state: Arc<AppState>, max_request_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/tree", get(get_tree))
        .route(
            "/action",
            post(post_action).layer(DefaultBodyLimit::max(max_request_bytes)),
        )
        .route("/download", get(download))
        .route("/media", get(media));

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
