use crate::room::RoomRegistry;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live rooms and their sessions
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}
