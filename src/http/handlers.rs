use super::state::AppState;
use crate::room::RoomSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::room::RoomRegistry;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Speaker's session identifier
    pub speaker_id: String,

    /// Display name shown to listeners
    pub speaker_name: Option<String>,

    /// Optional externally-assigned room id
    pub room_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CloseRoomResponse {
    pub room_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioFrameRequest {
    /// Base64-encoded PCM frame
    pub audio: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /rooms
/// Create a room and start its recognition session
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    let speaker_name = req.speaker_name.unwrap_or_else(|| "Speaker".to_string());

    match state
        .registry
        .create_room(&req.speaker_id, &speaker_name, req.room_id)
        .await
    {
        Ok(room_id) => {
            info!("room {} created via HTTP", room_id);
            (
                StatusCode::OK,
                Json(CreateRoomResponse {
                    room_id,
                    status: "created".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("failed to create room: {}", e);
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("failed to create room: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /rooms/:room_id/close
/// Begin room teardown; listeners are notified once the link closes
pub async fn close_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    if state.registry.begin_close(&room_id).await {
        (
            StatusCode::ACCEPTED,
            Json(CloseRoomResponse {
                room_id,
                status: "closing".to_string(),
            }),
        )
            .into_response()
    } else {
        room_not_found(&room_id)
    }
}

/// GET /rooms/:room_id/status
pub async fn room_status(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.status(&room_id).await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => room_not_found(&room_id),
    }
}

/// GET /rooms
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSnapshot>> {
    Json(state.registry.snapshot_all().await)
}

/// POST /rooms/:room_id/audio
/// Ingest one base64-encoded PCM frame from the speaker
pub async fn ingest_audio(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<AudioFrameRequest>,
) -> impl IntoResponse {
    let Some(inlet) = state.registry.inlet(&room_id).await else {
        return room_not_found(&room_id);
    };

    match base64::engine::general_purpose::STANDARD.decode(&req.audio) {
        Ok(frame) => {
            inlet.submit(frame);
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid audio payload: {}", e),
            }),
        )
            .into_response(),
    }
}

/// GET /rooms/:room_id/events
/// Join a room as a listener; transcripts and translations arrive as SSE
pub async fn room_events(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Response {
    let Some(rx) = state.registry.subscribe(&room_id).await else {
        return room_not_found(&room_id);
    };

    let listener_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    state.registry.add_listener(&room_id, &listener_id).await;

    let guard = ListenerGuard {
        registry: state.registry.clone(),
        room_id,
        listener_id,
    };

    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        loop {
            match rx.recv().await {
                Ok(message) => match Event::default().json_data(&message) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), (rx, guard))),
                    Err(e) => {
                        warn!("failed to encode outbound message: {}", e);
                        continue;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("listener lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn room_not_found(room_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("room {} not found", room_id),
        }),
    )
        .into_response()
}

/// Removes the listener from the room when the SSE stream is dropped.
struct ListenerGuard {
    registry: Arc<RoomRegistry>,
    room_id: String,
    listener_id: String,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let registry = self.registry.clone();
        let room_id = std::mem::take(&mut self.room_id);
        let listener_id = std::mem::take(&mut self.listener_id);
        tokio::spawn(async move {
            registry.remove_listener(&room_id, &listener_id).await;
        });
    }
}
