//! API Routes
//!
//! Configures the Axum router with all sidecar endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_handler, clear_all_handler, clear_expired_handler, content_handler,
    delete_entry_handler, get_entry_handler, health_handler, refresh_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, since browser pages call the sidecar directly
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_all_handler))
        .route("/cache/clear-expired", post(clear_expired_handler))
        .route(
            "/cache/:key",
            get(get_entry_handler).delete(delete_entry_handler),
        )
        .route("/content", post(content_handler))
        .route("/content/refresh", post(refresh_handler))
        .route("/content/batch", post(batch_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
