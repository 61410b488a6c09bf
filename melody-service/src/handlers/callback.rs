use crate::dtos::CallbackAck;
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

/// `POST /callback`
///
/// Always answers 200: a payload we cannot use is logged and acknowledged
/// with an error body so the upstream does not keep redelivering it.
pub async fn suno_callback(State(state): State<AppState>, body: Bytes) -> Json<CallbackAck> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Callback body is not JSON");
            return Json(CallbackAck::Error {
                message: format!("Invalid JSON: {}", e),
            });
        }
    };

    match state.relay.record_callback(&payload).await {
        Ok(task_id) => Json(CallbackAck::Stored { task_id }),
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "Callback could not be stored");
            Json(CallbackAck::Error {
                message: e.to_string(),
            })
        }
    }
}
