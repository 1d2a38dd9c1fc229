//! HTTP gateway for speakers and listeners
//!
//! This module provides the REST/SSE boundary of the service:
//! - POST /rooms - Create a room and start its recognition session
//! - POST /rooms/:id/close - Begin room teardown
//! - GET /rooms/:id/status - Query room status
//! - GET /rooms - List all rooms
//! - POST /rooms/:id/audio - Ingest one audio frame from the speaker
//! - GET /rooms/:id/events - Listener SSE stream
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
