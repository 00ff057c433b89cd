//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/search", get(handlers::search))
        .route("/health", get(handlers::health))
        // Outermost: CORS, then tracing, then panic recovery around the handlers.
        // Applied innermost-first as separate layers so each response body is
        // re-boxed into `axum::body::Body` (CORS requires `ResBody: Default`).
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}
