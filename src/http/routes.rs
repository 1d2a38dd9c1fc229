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
        // Room lifecycle
        .route(
            "/rooms",
            post(handlers::create_room).get(handlers::list_rooms),
        )
        .route("/rooms/:room_id/close", post(handlers::close_room))
        .route("/rooms/:room_id/status", get(handlers::room_status))
        // Speaker audio ingest
        .route("/rooms/:room_id/audio", post(handlers::ingest_audio))
        // Listener event stream
        .route("/rooms/:room_id/events", get(handlers::room_events))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
