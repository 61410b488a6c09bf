//! Request and response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const NOT_READY_MESSAGE: &str = "Music not ready yet. Try again shortly.";
pub const POLL_EXHAUSTED_MESSAGE: &str = "Music generation took too long. Try again.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateMusicRequest {
    #[validate(custom(function = "not_blank"))]
    pub prompt: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Prompt cannot be empty.".into());
        return Err(err);
    }
    Ok(())
}

/// Body of a successful `/generate_music` or `/music/:task_id` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MusicResponse {
    /// Callback mode: the task was accepted and will be delivered later.
    Accepted {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    /// Task state, resolved or not. `music_url` is `null` while pending.
    Task {
        #[serde(rename = "taskId")]
        task_id: String,
        music_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Upstream could not serve the request; a sample track is returned.
    Fallback { music_url: String, message: String },
}

impl MusicResponse {
    pub fn ready(task_id: impl Into<String>, music_url: impl Into<String>) -> Self {
        MusicResponse::Task {
            task_id: task_id.into(),
            music_url: Some(music_url.into()),
            message: None,
        }
    }

    pub fn not_ready(task_id: impl Into<String>, message: &str) -> Self {
        MusicResponse::Task {
            task_id: task_id.into(),
            music_url: None,
            message: Some(message.to_string()),
        }
    }
}

/// Acknowledgement returned to the upstream after a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CallbackAck {
    Stored {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub suno_status: crate::services::providers::UpstreamStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
}
