//! Music generation provider abstraction.
//!
//! The relay talks to the upstream only through [`MusicProvider`], so the
//! Suno client can be swapped for the in-process mock in tests.

pub mod mock;
pub mod suno;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TRACK_TITLE: &str = "Melody AI Track";

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request never produced a response (connect failure, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status without a usable body.
    #[error("Upstream returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Response body was not the JSON we expect.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Upstream answered with an application-level error code.
    #[error("Upstream rejected request with code {code}: {message}")]
    Rejected { code: i64, message: String },

    #[error("No task ID returned from upstream")]
    MissingTaskId,
}

impl ProviderError {
    /// Transport failures and 5xx responses may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Outbound generation request, serialized as the upstream expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    pub prompt: String,
    pub title: String,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: String,
    pub call_back_url: Option<String>,
}

impl GenerationPayload {
    pub fn new(prompt: &str, model: &str, call_back_url: Option<String>) -> Self {
        Self {
            prompt: prompt.to_string(),
            title: DEFAULT_TRACK_TITLE.to_string(),
            custom_mode: true,
            instrumental: true,
            model: model.to_string(),
            call_back_url,
        }
    }
}

/// Result of a submission the upstream answered meaningfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { task_id: String },
    /// Out of credits (code 429).
    QuotaExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamStatus {
    Online,
    Offline,
    Unreachable,
}

#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// Submit one generation request.
    async fn submit(&self, payload: &GenerationPayload) -> Result<SubmitOutcome, ProviderError>;

    /// Audio URL for `task_id` if generation has finished.
    async fn poll_status(&self, task_id: &str) -> Result<Option<String>, ProviderError>;

    /// Lightweight reachability probe.
    async fn health_check(&self) -> UpstreamStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_uses_upstream_field_names() {
        let payload = GenerationPayload::new("upbeat jazz", "V3_5", None);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "prompt": "upbeat jazz",
                "title": "Melody AI Track",
                "customMode": true,
                "instrumental": true,
                "model": "V3_5",
                "callBackUrl": null
            })
        );
    }

    #[test]
    fn payload_carries_callback_address() {
        let payload = GenerationPayload::new(
            "lofi",
            "V3_5",
            Some("https://relay.example/callback".to_string()),
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["callBackUrl"], "https://relay.example/callback");
    }

    #[test]
    fn retryable_errors() {
        assert!(ProviderError::Network("timeout".into()).is_retryable());
        assert!(ProviderError::UnexpectedStatus {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::UnexpectedStatus {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::MissingTaskId.is_retryable());
        assert!(!ProviderError::InvalidResponse("html".into()).is_retryable());
    }
}
