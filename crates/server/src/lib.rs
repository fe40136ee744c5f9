pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Slack on top of the preview timeout before the request itself is cut off.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Builds the application router.
///
/// `preview_timeout` is the engine's fetch bound; the HTTP layer timeout is
/// set slightly above it so a slow target surfaces as a `timeout` preview
/// rather than a dropped connection.
pub fn app(state: AppState, preview_timeout: Duration, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/articles/preview-url", post(handlers::preview::preview_url))
        .route("/api/preview", get(handlers::preview::preview_query))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            preview_timeout + REQUEST_TIMEOUT_SLACK,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
