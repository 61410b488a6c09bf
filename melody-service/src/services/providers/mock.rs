//! Mock provider for testing.

use super::{GenerationPayload, MusicProvider, ProviderError, SubmitOutcome, UpstreamStatus};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Scripted in-process provider that records how it was called.
pub struct MockMusicProvider {
    submit_result: Result<SubmitOutcome, ProviderError>,
    /// Polls answered "pending" before the track becomes ready; `None` never resolves.
    ready_after: Option<u32>,
    audio_url: String,
    status: UpstreamStatus,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
    last_payload: Mutex<Option<GenerationPayload>>,
}

impl MockMusicProvider {
    fn with_result(submit_result: Result<SubmitOutcome, ProviderError>) -> Self {
        Self {
            submit_result,
            ready_after: None,
            audio_url: "https://cdn.mock/track.mp3".to_string(),
            status: UpstreamStatus::Online,
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            last_payload: Mutex::new(None),
        }
    }

    pub fn accepting(task_id: &str) -> Self {
        Self::with_result(Ok(SubmitOutcome::Accepted {
            task_id: task_id.to_string(),
        }))
    }

    pub fn quota_exhausted() -> Self {
        Self::with_result(Ok(SubmitOutcome::QuotaExhausted))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_result(Err(error))
    }

    pub fn ready_after(mut self, pending_polls: u32, audio_url: &str) -> Self {
        self.ready_after = Some(pending_polls);
        self.audio_url = audio_url.to_string();
        self
    }

    pub fn with_status(mut self, status: UpstreamStatus) -> Self {
        self.status = status;
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<GenerationPayload> {
        self.last_payload
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }
}

#[async_trait]
impl MusicProvider for MockMusicProvider {
    async fn submit(&self, payload: &GenerationPayload) -> Result<SubmitOutcome, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_payload.lock() {
            *last = Some(payload.clone());
        }
        self.submit_result.clone()
    }

    async fn poll_status(&self, _task_id: &str) -> Result<Option<String>, ProviderError> {
        let seen = self.poll_calls.fetch_add(1, Ordering::SeqCst);
        match self.ready_after {
            Some(pending) if seen >= pending => Ok(Some(self.audio_url.clone())),
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> UpstreamStatus {
        self.status
    }
}
