//! Callback delivery: `/callback` writes, `/music/:task_id` reads.

mod common;

use axum::http::StatusCode;
use common::{app, get, post_json, post_raw, test_config};
use melody_service::config::DeliveryMode;
use serde_json::json;

const UNUSED_UPSTREAM: &str = "http://127.0.0.1:9";

#[tokio::test]
async fn stored_callback_is_served_by_lookup() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));

    let (status, body) = post_json(
        &app,
        "/callback",
        json!({"data": {"id": "abc123", "audio_url": "https://x/y.mp3"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "stored", "taskId": "abc123"}));

    let (status, body) = get(&app, "/music/abc123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"taskId": "abc123", "music_url": "https://x/y.mp3"}));
}

#[tokio::test]
async fn suno_completion_payload_is_understood() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));

    let (_, body) = post_json(
        &app,
        "/callback",
        json!({
            "code": 200,
            "msg": "All generated successfully.",
            "data": {
                "callbackType": "complete",
                "task_id": "t-77",
                "data": [
                    {"id": "clip-1", "audio_url": "https://cdn/clip-1.mp3"},
                    {"id": "clip-2", "audio_url": "https://cdn/clip-2.mp3"}
                ]
            }
        }),
    )
    .await;
    assert_eq!(body, json!({"status": "stored", "taskId": "t-77"}));

    let (_, body) = get(&app, "/music/t-77").await;
    assert_eq!(body["music_url"], "https://cdn/clip-1.mp3");
}

#[tokio::test]
async fn repeated_callback_keeps_single_entry() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));
    let payload = json!({"data": {"id": "abc123", "audio_url": "https://x/y.mp3"}});

    post_json(&app, "/callback", payload.clone()).await;
    post_json(&app, "/callback", payload).await;

    let (_, body) = get(&app, "/music/abc123").await;
    assert_eq!(body, json!({"taskId": "abc123", "music_url": "https://x/y.mp3"}));

    post_json(
        &app,
        "/callback",
        json!({"data": {"id": "abc123", "audio_url": "https://x/z.mp3"}}),
    )
    .await;
    let (_, body) = get(&app, "/music/abc123").await;
    assert_eq!(body["music_url"], "https://x/z.mp3");
}

#[tokio::test]
async fn incomplete_callback_is_acknowledged_with_error() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));

    let (status, body) = post_json(&app, "/callback", json!({"data": {"id": "abc123"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("audio_url"));

    let (_, body) = get(&app, "/music/abc123").await;
    assert!(body["music_url"].is_null());
}

#[tokio::test]
async fn malformed_callback_body_is_acknowledged_with_error() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));

    let (status, body) = post_raw(&app, "/callback", "not json".to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unknown_task_is_not_ready_by_default() {
    let app = app(test_config(UNUSED_UPSTREAM, DeliveryMode::Callback));

    let (status, body) = get(&app, "/music/never-seen").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["taskId"], "never-seen");
    assert!(body["music_url"].is_null());
}

#[tokio::test]
async fn unknown_task_is_404_in_strict_mode() {
    let mut config = test_config(UNUSED_UPSTREAM, DeliveryMode::Callback);
    config.store.unknown_is_not_found = true;
    let app = app(config);

    let (status, _) = get(&app, "/music/never-seen").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
