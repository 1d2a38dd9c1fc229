use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use super::model::{Room, RoomSnapshot, RoomStatus, OUTBOUND_CHANNEL_CAPACITY};
use crate::config::RecognitionConfig;
use crate::session::{spawn_session, DispatchBridge, OutboundMessage};
use crate::stt::{AudioInlet, BatchLimits};

/// Owned room storage: creation, lookup, membership, and teardown of the
/// per-room recognition sessions.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Room>>,
    recognition: RecognitionConfig,
    limits: BatchLimits,
    bridge: Arc<DispatchBridge>,
}

impl RoomRegistry {
    pub fn new(
        recognition: RecognitionConfig,
        limits: BatchLimits,
        bridge: Arc<DispatchBridge>,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            recognition,
            limits,
            bridge,
        }
    }

    /// Create a room and spawn its recognition session. Returns the room id.
    pub async fn create_room(
        &self,
        speaker_id: &str,
        speaker_name: &str,
        room_id: Option<String>,
    ) -> Result<String> {
        let mut rooms = self.rooms.write().await;

        let room_id = match room_id {
            Some(id) => {
                if rooms.contains_key(&id) {
                    bail!("room {} already exists", id);
                }
                id
            }
            None => generate_room_id(&rooms),
        };

        let inlet = AudioInlet::new();
        let (outbound, _) = broadcast::channel(OUTBOUND_CHANNEL_CAPACITY);

        let session = spawn_session(
            room_id.clone(),
            self.recognition.clone(),
            self.limits.clone(),
            inlet.clone(),
            self.bridge.clone(),
        )?;

        let room = Room {
            room_id: room_id.clone(),
            speaker_id: speaker_id.to_string(),
            speaker_name: speaker_name.to_string(),
            listeners: std::collections::HashSet::new(),
            status: RoomStatus::Active,
            created_at: Utc::now(),
            inlet,
            outbound,
            session,
        };

        rooms.insert(room_id.clone(), room);
        info!("room {} created for speaker {}", room_id, speaker_name);

        Ok(room_id)
    }

    /// Audio conduit of a room, for the ingest path.
    pub async fn inlet(&self, room_id: &str) -> Option<AudioInlet> {
        self.rooms.read().await.get(room_id).map(|r| r.inlet.clone())
    }

    /// Subscribe to a room's listener-facing messages.
    pub async fn subscribe(&self, room_id: &str) -> Option<broadcast::Receiver<OutboundMessage>> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(|r| r.outbound.subscribe())
    }

    /// Broadcast a message to a room's listeners. No-op for unknown rooms
    /// or rooms without live subscribers.
    pub async fn broadcast(&self, room_id: &str, message: OutboundMessage) {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            // Send fails only when no receiver is subscribed.
            let _ = room.outbound.send(message);
        }
    }

    pub async fn add_listener(&self, room_id: &str, listener_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.listeners.insert(listener_id.to_string());
                info!(
                    "room {}: listener joined ({} total)",
                    room_id,
                    room.listeners.len()
                );
                true
            }
            None => false,
        }
    }

    pub async fn remove_listener(&self, room_id: &str, listener_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.listeners.remove(listener_id);
                info!(
                    "room {}: listener left ({} remaining)",
                    room_id,
                    room.listeners.len()
                );
                true
            }
            None => false,
        }
    }

    /// Begin teardown: stop accepting audio and signal the session loops.
    /// The room is removed once its link reports closed.
    pub async fn begin_close(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.status = RoomStatus::Closing;
                room.inlet.close();
                room.session.signal_shutdown();
                info!("room {} closing", room_id);
                true
            }
            None => {
                warn!("close requested for unknown room {}", room_id);
                false
            }
        }
    }

    /// Remove a room from the registry, returning it for final teardown.
    pub async fn remove(&self, room_id: &str) -> Option<Room> {
        self.rooms.write().await.remove(room_id)
    }

    pub async fn status(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.rooms.read().await.get(room_id).map(Room::snapshot)
    }

    pub async fn snapshot_all(&self) -> Vec<RoomSnapshot> {
        self.rooms.read().await.values().map(Room::snapshot).collect()
    }

    pub async fn find_room_by_speaker(&self, speaker_id: &str) -> Option<String> {
        self.rooms
            .read()
            .await
            .values()
            .find(|room| room.speaker_id == speaker_id)
            .map(|room| room.room_id.clone())
    }

    pub async fn total_listeners(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .map(|room| room.listeners.len())
            .sum()
    }

    /// A disconnected speaker closes their room; a disconnected listener is
    /// removed from every room they joined.
    pub async fn cleanup_disconnected(&self, session_id: &str) {
        if let Some(room_id) = self.find_room_by_speaker(session_id).await {
            self.begin_close(&room_id).await;
            return;
        }

        let mut rooms = self.rooms.write().await;
        for room in rooms.values_mut() {
            room.listeners.remove(session_id);
        }
    }
}

/// Six-character opaque room id, collision-checked against live rooms.
fn generate_room_id(rooms: &HashMap<String, Room>) -> String {
    loop {
        let id = uuid::Uuid::new_v4().simple().to_string()[..6].to_string();
        if !rooms.contains_key(&id) {
            return id;
        }
    }
}
