//! The relay: prompt in, audio URL out.
//!
//! A submission is resolved either by polling the upstream from inside the
//! request or by waiting for the upstream's callback, depending on the
//! configured [`DeliveryMode`]. Both paths write into the [`ResultStore`].

use crate::config::{DeliveryMode, MelodyConfig};
use crate::dtos::{MusicResponse, NOT_READY_MESSAGE, POLL_EXHAUSTED_MESSAGE};
use crate::services::providers::suno::{extract_audio_url, extract_task_id};
use crate::services::providers::{
    GenerationPayload, MusicProvider, ProviderError, SubmitOutcome, UpstreamStatus,
};
use crate::services::result_store::{ResultStore, TaskState};
use metrics::counter;
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Sample track served when the upstream is out of credits.
pub const FALLBACK_MUSIC_URL: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3";
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "Suno credits exhausted. Here's a sample melody instead!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Prompt cannot be empty.")]
    EmptyPrompt,

    #[error("Upstream unreachable: {0}")]
    Transport(String),

    #[error("Upstream protocol error: {0}")]
    Protocol(String),

    #[error("Upstream rejected request (code {code}): {message}")]
    Business { code: i64, message: String },

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Task {0} not found")]
    NotFound(String),
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(msg) => RelayError::Transport(msg),
            ProviderError::UnexpectedStatus { .. } | ProviderError::InvalidResponse(_) => {
                RelayError::Protocol(err.to_string())
            }
            ProviderError::Rejected { code, message } => RelayError::Business { code, message },
            ProviderError::MissingTaskId => {
                RelayError::MissingData("No task ID returned from Suno.".to_string())
            }
        }
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::EmptyPrompt => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            RelayError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            RelayError::Transport(_)
            | RelayError::Protocol(_)
            | RelayError::Business { .. }
            | RelayError::MissingData(_) => AppError::BadGateway(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct RelayService {
    provider: Arc<dyn MusicProvider>,
    store: Arc<dyn ResultStore>,
    mode: DeliveryMode,
    model: String,
    callback_url: Option<String>,
    poll_interval: Duration,
    poll_max_attempts: u32,
    unknown_is_not_found: bool,
}

impl RelayService {
    pub fn new(
        config: &MelodyConfig,
        provider: Arc<dyn MusicProvider>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            provider,
            store,
            mode: config.delivery.mode,
            model: config.suno.model.clone(),
            callback_url: config.callback_url(),
            poll_interval: config.delivery.poll_interval,
            poll_max_attempts: config.delivery.poll_max_attempts,
            unknown_is_not_found: config.store.unknown_is_not_found,
        }
    }

    /// Submit a prompt and, in polling mode, wait for the track.
    ///
    /// Quota exhaustion is answered with [`FALLBACK_MUSIC_URL`], never an error.
    pub async fn submit(&self, prompt: &str) -> Result<MusicResponse, RelayError> {
        if prompt.trim().is_empty() {
            return Err(RelayError::EmptyPrompt);
        }

        let payload = GenerationPayload::new(prompt, &self.model, self.callback_url.clone());

        let outcome = self.provider.submit(&payload).await.map_err(|e| {
            tracing::error!(error = %e, "Suno submission failed");
            counter!("melody_submissions_total", "outcome" => "error").increment(1);
            RelayError::from(e)
        })?;

        let task_id = match outcome {
            SubmitOutcome::QuotaExhausted => {
                tracing::warn!("Suno credits exhausted, serving fallback track");
                counter!("melody_submissions_total", "outcome" => "quota_exhausted").increment(1);
                return Ok(MusicResponse::Fallback {
                    music_url: FALLBACK_MUSIC_URL.to_string(),
                    message: QUOTA_EXHAUSTED_MESSAGE.to_string(),
                });
            }
            SubmitOutcome::Accepted { task_id } => task_id,
        };

        counter!("melody_submissions_total", "outcome" => "accepted").increment(1);
        tracing::info!(task_id = %task_id, mode = %self.mode, "Task ID received");
        self.store.mark_pending(&task_id).await;

        match self.mode {
            DeliveryMode::Callback => Ok(MusicResponse::Accepted { task_id }),
            DeliveryMode::Polling => Ok(match self.poll_until_ready(&task_id).await {
                Some(url) => MusicResponse::ready(task_id, url),
                None => MusicResponse::not_ready(task_id, POLL_EXHAUSTED_MESSAGE),
            }),
        }
    }

    /// Poll the upstream until an audio URL appears or the attempt budget is
    /// spent. Failed or undecodable polls use up an attempt and are skipped.
    pub async fn poll_until_ready(&self, task_id: &str) -> Option<String> {
        for attempt in 1..=self.poll_max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            counter!("melody_poll_attempts_total").increment(1);

            match self.provider.poll_status(task_id).await {
                Ok(Some(url)) => {
                    tracing::info!(task_id = %task_id, attempt, audio_url = %url, "Music ready");
                    self.store.store_result(task_id, &url).await;
                    return Some(url);
                }
                Ok(None) => {
                    tracing::debug!(task_id = %task_id, attempt, "Music not ready yet");
                }
                Err(e) => {
                    tracing::warn!(task_id = %task_id, attempt, error = %e, "Status poll failed");
                }
            }
        }

        tracing::warn!(
            task_id = %task_id,
            attempts = self.poll_max_attempts,
            "Polling budget exhausted"
        );
        None
    }

    /// Current state of a task as seen by this process.
    pub async fn lookup(&self, task_id: &str) -> Result<MusicResponse, RelayError> {
        match self.store.get(task_id).await {
            Some(TaskState::Ready(url)) => Ok(MusicResponse::ready(task_id, url)),
            Some(TaskState::Pending) => Ok(MusicResponse::not_ready(task_id, NOT_READY_MESSAGE)),
            None if self.unknown_is_not_found => Err(RelayError::NotFound(task_id.to_string())),
            None => Ok(MusicResponse::not_ready(task_id, NOT_READY_MESSAGE)),
        }
    }

    /// Store the result carried by an upstream completion notification.
    ///
    /// The payload is read from its `data` object when present, otherwise from
    /// the top level. Returns the task id that was stored.
    pub async fn record_callback(&self, payload: &Value) -> Result<String, RelayError> {
        let data = match payload.get("data") {
            Some(data) if data.is_object() => data,
            _ => payload,
        };

        let task_id = extract_task_id(data)
            .or_else(|| extract_task_id(payload))
            .ok_or_else(|| {
                counter!("melody_callbacks_total", "outcome" => "error").increment(1);
                RelayError::MissingData("callback carries no task id".to_string())
            })?;

        let audio_url = extract_audio_url(data).ok_or_else(|| {
            counter!("melody_callbacks_total", "outcome" => "error").increment(1);
            RelayError::MissingData(format!("callback for task {} carries no audio_url", task_id))
        })?;

        self.store.store_result(&task_id, &audio_url).await;
        counter!("melody_callbacks_total", "outcome" => "stored").increment(1);
        tracing::info!(task_id = %task_id, audio_url = %audio_url, "Stored callback result");

        Ok(task_id)
    }

    pub async fn health(&self) -> UpstreamStatus {
        self.provider.health_check().await
    }
}
