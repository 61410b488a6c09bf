//! Suno API provider (`api.sunoapi.org`).
//!
//! Responses are wrapped in `{code, msg, data}`; only the fields the relay
//! needs are read and everything else is ignored.

use super::{GenerationPayload, MusicProvider, ProviderError, SubmitOutcome, UpstreamStatus};
use crate::config::MelodyConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use service_core::retry::{retry_with_policy, RetryPolicy};

/// Upstream body code meaning the account is out of credits.
pub const QUOTA_EXHAUSTED_CODE: i64 = 429;
const SUCCESS_CODE: i64 = 200;
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Deserialize)]
struct SunoEnvelope {
    code: Option<i64>,
    msg: Option<String>,
    #[serde(default)]
    data: Value,
}

pub struct SunoProvider {
    client: Client,
    config: MelodyConfig,
    generate_url: String,
    retry: RetryPolicy,
}

impl SunoProvider {
    pub fn new(config: &MelodyConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.suno.submit_timeout)
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            generate_url: config.generate_url(),
            retry: RetryPolicy::with_max_retries(config.suno.submit_retries),
        })
    }

    fn api_key(&self) -> &str {
        self.config.suno.api_key.expose_secret()
    }

    async fn submit_once(
        &self,
        payload: &GenerationPayload,
    ) -> Result<SubmitOutcome, ProviderError> {
        let response = self
            .client
            .traced_post(&self.generate_url)
            .bearer_auth(self.api_key())
            .timeout(self.config.suno.submit_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(SubmitOutcome::QuotaExhausted);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let envelope: SunoEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                tracing::error!(error = %e, "Failed to decode upstream submit response");
                return Err(ProviderError::InvalidResponse(e.to_string()));
            }
            Err(_) => {
                return Err(ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    body: truncate(&body),
                })
            }
        };

        if envelope.code == Some(QUOTA_EXHAUSTED_CODE) {
            return Ok(SubmitOutcome::QuotaExhausted);
        }

        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        if let Some(code) = envelope.code.filter(|c| *c != SUCCESS_CODE) {
            return Err(ProviderError::Rejected {
                code,
                message: envelope.msg.unwrap_or_default(),
            });
        }

        extract_task_id(&envelope.data)
            .map(|task_id| SubmitOutcome::Accepted { task_id })
            .ok_or(ProviderError::MissingTaskId)
    }
}

#[async_trait]
impl MusicProvider for SunoProvider {
    async fn submit(&self, payload: &GenerationPayload) -> Result<SubmitOutcome, ProviderError> {
        tracing::debug!(
            model = %payload.model,
            prompt_len = payload.prompt.len(),
            callback = payload.call_back_url.is_some(),
            "Submitting generation request to Suno"
        );

        retry_with_policy(
            &self.retry,
            "suno_submit",
            ProviderError::is_retryable,
            move || self.submit_once(payload),
        )
        .await
    }

    async fn poll_status(&self, task_id: &str) -> Result<Option<String>, ProviderError> {
        let url = self.config.status_url(task_id);
        let response = self
            .client
            .traced_get(&url)
            .bearer_auth(self.api_key())
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(extract_audio_url(&body["data"]))
    }

    async fn health_check(&self) -> UpstreamStatus {
        let result = self
            .client
            .traced_get(&self.generate_url)
            .bearer_auth(self.api_key())
            .timeout(self.config.suno.health_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => UpstreamStatus::Online,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Suno health probe not OK");
                UpstreamStatus::Offline
            }
            Err(e) => {
                tracing::warn!(error = %e, "Suno unreachable");
                UpstreamStatus::Unreachable
            }
        }
    }
}

/// Task id from a `data` object, accepting the spellings the upstream uses.
pub fn extract_task_id(data: &Value) -> Option<String> {
    first_string(data, &["id", "taskId", "task_id"])
}

/// Audio URL from a `data` object. A list of clips yields the first clip's URL.
pub fn extract_audio_url(data: &Value) -> Option<String> {
    if let Some(url) = first_string(data, &["audio_url", "audioUrl"]) {
        return Some(url);
    }

    let clips = data
        .get("data")
        .or_else(|| data.get("sunoData"))
        .and_then(Value::as_array)?;
    clips
        .iter()
        .find_map(|clip| first_string(clip, &["audio_url", "audioUrl"]))
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_LEN).collect()
}
