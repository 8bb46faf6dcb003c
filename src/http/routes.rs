use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/session/access", post(handlers::grant_access))
        .route("/session/start", post(handlers::start_recording))
        .route("/session/stop", post(handlers::stop_recording))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/level", get(handlers::get_level))
        // Assembled recording
        .route("/session/recording", get(handlers::download_recording))
        .route("/session/upload", post(handlers::upload_recording))
        .route("/session/save", post(handlers::save_recording))
        // Request logging; the control surface is consumed from a browser UI
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
