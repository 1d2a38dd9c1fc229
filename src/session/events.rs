use chrono::{DateTime, Utc};
use serde::Serialize;

/// Event raised inside a session's execution context and carried to the
/// primary runtime by the dispatch bridge.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// One finalized recognition fragment, relayed as-is for interim display.
    Transcript {
        room_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// A flushed sentence batch, ready for translation.
    BatchReady {
        room_id: String,
        /// Short token correlating the provisional notice with its
        /// resolved translation.
        batch_id: String,
        korean_text: String,
        context: String,
        timestamp: DateTime<Utc>,
    },
    /// The recognition link reached its terminal state.
    LinkClosed { room_id: String, reason: String },
}

impl SessionEvent {
    pub fn room_id(&self) -> &str {
        match self {
            SessionEvent::Transcript { room_id, .. } => room_id,
            SessionEvent::BatchReady { room_id, .. } => room_id,
            SessionEvent::LinkClosed { room_id, .. } => room_id,
        }
    }
}

/// Listener-facing message broadcast on a room's outbound channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Interim recognition text, one per fragment.
    Stt {
        room_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// A translated batch; emitted once as a provisional notice and once
    /// resolved, correlated by `batch_id`.
    Translation {
        room_id: String,
        batch_id: String,
        korean: String,
        english: String,
        timestamp: DateTime<Utc>,
    },
    /// Terminal notification: the speaker disconnected or the room closed.
    RoomClosed { room_id: String, reason: String },
}
