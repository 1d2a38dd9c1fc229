use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::events::{OutboundMessage, SessionEvent};
use crate::room::RoomRegistry;
use crate::translate::Translator;

/// Provisional text shown to listeners while a batch is being translated.
pub const PENDING_TRANSLATION: &str = "번역 중...";
/// Explicit degraded-batch marker when translation fails.
pub const FAILED_TRANSLATION: &str = "translation unavailable";

/// Primary-runtime consumer of session events: relays interim transcripts,
/// translates batches, and finalizes rooms whose link has closed.
pub async fn run_event_pump(
    registry: Arc<RoomRegistry>,
    translator: Arc<Translator>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    info!("event pump started");

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Transcript {
                room_id,
                text,
                timestamp,
            } => {
                registry
                    .broadcast(
                        &room_id,
                        OutboundMessage::Stt {
                            room_id: room_id.clone(),
                            text,
                            timestamp,
                        },
                    )
                    .await;
            }

            SessionEvent::BatchReady {
                room_id,
                batch_id,
                korean_text,
                context,
                timestamp,
            } => {
                registry
                    .broadcast(
                        &room_id,
                        OutboundMessage::Translation {
                            room_id: room_id.clone(),
                            batch_id: batch_id.clone(),
                            korean: korean_text.clone(),
                            english: PENDING_TRANSLATION.to_string(),
                            timestamp,
                        },
                    )
                    .await;

                // Translation must not stall the pump; one task per batch,
                // failures degrade that batch only.
                let registry = registry.clone();
                let translator = translator.clone();
                tokio::spawn(async move {
                    let english = match translator.translate(&korean_text, &context).await {
                        Ok(text) => text,
                        Err(e) => {
                            error!("translation failed for room {}: {}", room_id, e);
                            FAILED_TRANSLATION.to_string()
                        }
                    };
                    registry
                        .broadcast(
                            &room_id,
                            OutboundMessage::Translation {
                                room_id: room_id.clone(),
                                batch_id,
                                korean: korean_text,
                                english,
                                timestamp: Utc::now(),
                            },
                        )
                        .await;
                });
            }

            SessionEvent::LinkClosed { room_id, reason } => {
                info!("room {} link closed: {}", room_id, reason);
                registry
                    .broadcast(
                        &room_id,
                        OutboundMessage::RoomClosed {
                            room_id: room_id.clone(),
                            reason,
                        },
                    )
                    .await;

                if let Some(mut room) = registry.remove(&room_id).await {
                    room.session.signal_shutdown();
                    let _ = tokio::task::spawn_blocking(move || room.session.join()).await;
                }
            }
        }
    }

    info!("event pump stopped");
}
