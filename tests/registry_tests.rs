use std::sync::Arc;
use std::time::Duration;

use speechbridge::config::RecognitionConfig;
use speechbridge::{BatchLimits, DispatchBridge, RoomRegistry, RoomStatus, SessionEvent};

/// Recognition config pointing at an unreachable endpoint, so sessions
/// fail authentication immediately instead of touching the network.
fn unreachable_recognition() -> RecognitionConfig {
    RecognitionConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        streaming_base: "ws://127.0.0.1:1".to_string(),
        ..RecognitionConfig::default()
    }
}

fn registry_with_bridge() -> (
    Arc<RoomRegistry>,
    tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
) {
    let bridge = Arc::new(DispatchBridge::new());
    let events = bridge.channel();
    let registry = Arc::new(RoomRegistry::new(
        unreachable_recognition(),
        BatchLimits::default(),
        bridge,
    ));
    (registry, events)
}

#[tokio::test]
async fn test_create_and_query_room() {
    let (registry, _events) = registry_with_bridge();

    let room_id = registry
        .create_room("speaker-1", "Alice", None)
        .await
        .unwrap();
    assert_eq!(room_id.len(), 6);

    let status = registry.status(&room_id).await.unwrap();
    assert_eq!(status.room_id, room_id);
    assert_eq!(status.speaker_name, "Alice");
    assert_eq!(status.listener_count, 0);
    assert_eq!(status.status, RoomStatus::Active);

    assert_eq!(registry.snapshot_all().await.len(), 1);
    assert!(registry.status("nonexistent").await.is_none());
}

#[tokio::test]
async fn test_explicit_room_id_and_collision() {
    let (registry, _events) = registry_with_bridge();

    let room_id = registry
        .create_room("speaker-1", "Alice", Some("room42".to_string()))
        .await
        .unwrap();
    assert_eq!(room_id, "room42");

    let duplicate = registry
        .create_room("speaker-2", "Bob", Some("room42".to_string()))
        .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_listener_membership() {
    let (registry, _events) = registry_with_bridge();
    let room_id = registry
        .create_room("speaker-1", "Alice", None)
        .await
        .unwrap();

    assert!(registry.add_listener(&room_id, "listener-1").await);
    assert!(registry.add_listener(&room_id, "listener-2").await);
    assert_eq!(registry.total_listeners().await, 2);

    assert!(registry.remove_listener(&room_id, "listener-1").await);
    assert_eq!(registry.total_listeners().await, 1);

    assert!(!registry.add_listener("nonexistent", "listener-3").await);
    assert!(!registry.remove_listener("nonexistent", "listener-1").await);
}

#[tokio::test]
async fn test_speaker_disconnect_closes_room() {
    let (registry, _events) = registry_with_bridge();
    let room_id = registry
        .create_room("speaker-1", "Alice", None)
        .await
        .unwrap();

    registry.cleanup_disconnected("speaker-1").await;

    let status = registry.status(&room_id).await.unwrap();
    assert_eq!(status.status, RoomStatus::Closing);
}

#[tokio::test]
async fn test_listener_disconnect_leaves_all_rooms() {
    let (registry, _events) = registry_with_bridge();
    let room_a = registry.create_room("s1", "Alice", None).await.unwrap();
    let room_b = registry.create_room("s2", "Bob", None).await.unwrap();

    registry.add_listener(&room_a, "listener-1").await;
    registry.add_listener(&room_b, "listener-1").await;
    registry.add_listener(&room_b, "listener-2").await;

    registry.cleanup_disconnected("listener-1").await;

    assert_eq!(registry.status(&room_a).await.unwrap().listener_count, 0);
    assert_eq!(registry.status(&room_b).await.unwrap().listener_count, 1);
    assert_eq!(registry.total_listeners().await, 1);
}

#[tokio::test]
async fn test_begin_close_unknown_room() {
    let (registry, _events) = registry_with_bridge();
    assert!(!registry.begin_close("nonexistent").await);
}

#[tokio::test]
async fn test_auth_failure_is_terminal_and_discards_audio() {
    let (registry, mut events) = registry_with_bridge();
    let room_id = registry
        .create_room("speaker-1", "Alice", None)
        .await
        .unwrap();

    let inlet = registry.inlet(&room_id).await.unwrap();

    // The token endpoint is unreachable, so the session reports a
    // terminal close without ever reaching Ready.
    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("terminal notification must arrive")
        .unwrap();
    match event {
        SessionEvent::LinkClosed { room_id: id, reason } => {
            assert_eq!(id, room_id);
            assert!(reason.contains("authentication"), "reason: {}", reason);
        }
        other => panic!("expected LinkClosed, got {:?}", other),
    }

    let status = registry.status(&room_id).await.unwrap();
    assert_eq!(status.recognition_state, "closed");

    // Frames submitted after the terminal failure are silently discarded.
    inlet.submit(vec![0u8; 320]);
    assert!(inlet.is_closed());
    assert_eq!(inlet.outbound_len(), 0);
    assert_eq!(inlet.pending_len(), 0);
}
