use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::session::{OutboundMessage, SessionHandle};
use crate::stt::AudioInlet;

/// Listener-facing broadcast channel depth per room.
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Active,
    Closing,
    Closed,
}

/// Per-room state: speaker identity, listener membership, and the handles
/// wiring the room to its recognition session.
pub struct Room {
    pub room_id: String,
    pub speaker_id: String,
    pub speaker_name: String,
    pub listeners: HashSet<String>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    /// Audio conduit shared with the ingest path.
    pub inlet: AudioInlet,
    /// Listener-facing outbound messages.
    pub outbound: broadcast::Sender<OutboundMessage>,
    pub session: SessionHandle,
}

/// Immutable status view of one room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub speaker_name: String,
    pub listener_count: usize,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub recognition_state: String,
}

impl Room {
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            speaker_name: self.speaker_name.clone(),
            listener_count: self.listeners.len(),
            status: self.status,
            created_at: self.created_at,
            recognition_state: self.session.link_state().as_str().to_string(),
        }
    }
}
