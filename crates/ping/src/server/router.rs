//! Axum router construction.

use axum::{routing::any, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build() -> Router {
    Router::new()
        .route("/v1/ping", any(handlers::ping))
        .fallback(handlers::ping)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
}
