//! Shared helpers for melody-service integration tests.
//!
//! The upstream is faked with wiremock; the router is driven in-process with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use melody_service::config::{
    CorsConfig, DeliveryConfig, DeliveryMode, MelodyConfig, StoreConfig, SunoConfig,
};
use melody_service::services::providers::suno::SunoProvider;
use melody_service::startup::build_router;
use melody_service::AppState;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";
pub const POLL_ATTEMPTS: u32 = 3;

pub fn test_config(upstream: &str, mode: DeliveryMode) -> MelodyConfig {
    MelodyConfig {
        common: CommonConfig { port: 0 },
        suno: SunoConfig {
            api_key: Secret::new(TEST_API_KEY.to_string()),
            base_url: upstream.trim_end_matches('/').to_string(),
            model: "V3_5".to_string(),
            submit_timeout: Duration::from_secs(5),
            health_timeout: Duration::from_secs(2),
            submit_retries: 0,
        },
        delivery: DeliveryConfig {
            mode,
            public_base_url: "https://relay.example".to_string(),
            poll_interval: Duration::from_millis(5),
            poll_max_attempts: POLL_ATTEMPTS,
        },
        store: StoreConfig {
            ttl: Duration::from_secs(60),
            max_entries: 1_000,
            unknown_is_not_found: false,
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

/// Router wired to the real Suno client pointed at `config.suno.base_url`.
pub fn app(config: MelodyConfig) -> Router {
    let provider = Arc::new(SunoProvider::new(&config).expect("Failed to build Suno provider"));
    build_router(AppState::new(config, provider))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, body)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}
