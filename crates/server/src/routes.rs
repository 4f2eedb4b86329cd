//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness probe (intentionally unauthenticated).
        .route("/-/ping", get(handlers::ping))
        // Attachment methods.
        .route(
            "/{package}/-/{attachment}",
            get(handlers::download)
                .put(handlers::attach)
                .delete(handlers::detach),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
