use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:session_id/start", post(handlers::start_session))
        .route("/sessions/:session_id/stop", post(handlers::stop_session))
        .route("/sessions/:session_id/mute", post(handlers::toggle_mute))
        // Session queries & teardown
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route(
            "/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        // Request logging; permissive CORS because the consumer is the
        // browser page.
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
