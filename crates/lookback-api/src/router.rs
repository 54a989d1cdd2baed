//! Axum router construction for the Lookback API.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing middleware. Unknown paths and wrong methods fall through to
//! JSON fallbacks so every error response shares the same shape.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Lookback server.
///
/// The router includes:
/// - `GET /` -- service descriptor
/// - `POST /event` -- record one timestamped value
/// - `GET /statistics` -- rolling one-hour aggregates
/// - `GET /health` -- liveness probe
///
/// CORS allows any origin, which suits development; restrict it before
/// exposing the service beyond a trusted network.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/event", post(handlers::record_event))
        .route("/statistics", get(handlers::get_statistics))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
