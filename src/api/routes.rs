//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, hget_handler, hset_handler, resolve_handler,
    set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|PUT|DELETE /cache/:group/:key` - Plain key operations
/// - `GET|PUT /cache/:group/:key/:field` - Hash field operations
/// - `POST /urls/resolve` - Resolve storage references into signed URLs
/// - `GET /stats` - Local-tier statistics per group
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:group/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route(
            "/cache/:group/:key/:field",
            get(hget_handler).put(hset_handler),
        )
        .route("/urls/resolve", post(resolve_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
