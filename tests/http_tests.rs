use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use serde_json::{json, Value};
use speechbridge::config::RecognitionConfig;
use speechbridge::{create_router, AppState, BatchLimits, DispatchBridge, RoomRegistry};
use tower::ServiceExt;

fn test_router() -> Router {
    let bridge = Arc::new(DispatchBridge::new());
    // Drain session events so session threads never block on delivery.
    let mut events = bridge.channel();
    tokio::spawn(async move { while events.recv().await.is_some() {} });

    let recognition = RecognitionConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        streaming_base: "ws://127.0.0.1:1".to_string(),
        ..RecognitionConfig::default()
    };
    let registry = Arc::new(RoomRegistry::new(
        recognition,
        BatchLimits::default(),
        bridge,
    ));
    create_router(AppState::new(registry))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let router = test_router();
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_room_lifecycle_over_http() {
    let router = test_router();

    // Create
    let response = router
        .clone()
        .oneshot(post_json(
            "/rooms",
            json!({"speaker_id": "spk-1", "speaker_name": "Alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "created");

    // Status
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/rooms/{}/status", room_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["speaker_name"], "Alice");
    assert_eq!(status["listener_count"], 0);

    // List
    let response = router
        .clone()
        .oneshot(Request::builder().uri("/rooms").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let rooms = body_json(response).await;
    assert_eq!(rooms.as_array().unwrap().len(), 1);

    // Close
    let response = router
        .clone()
        .oneshot(post_json(&format!("/rooms/{}/close", room_id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/rooms/{}/status", room_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = body_json(response).await;
    assert_eq!(status["status"], "closing");
}

#[tokio::test]
async fn test_audio_ingest() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(post_json("/rooms", json!({"speaker_id": "spk-1"})))
        .await
        .unwrap();
    let room_id = body_json(response).await["room_id"]
        .as_str()
        .unwrap()
        .to_string();

    let frame = base64::engine::general_purpose::STANDARD.encode([0u8; 320]);
    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/rooms/{}/audio", room_id),
            json!({"audio": frame}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Invalid base64 payloads are rejected.
    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/rooms/{}/audio", room_id),
            json!({"audio": "not base64!!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown rooms yield 404.
    let response = router
        .oneshot(post_json("/rooms/zzzzzz/audio", json!({"audio": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_room_endpoints_return_404() {
    let router = test_router();

    for uri in ["/rooms/zzzzzz/status", "/rooms/zzzzzz/events"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri: {}", uri);
    }

    let response = router
        .oneshot(post_json("/rooms/zzzzzz/close", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
