use crate::dtos::{GenerateMusicRequest, MusicResponse};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// `POST /generate_music`
pub async fn generate_music(
    State(state): State<AppState>,
    Json(request): Json<GenerateMusicRequest>,
) -> Result<Json<MusicResponse>, AppError> {
    request.validate()?;

    let response = state.relay.submit(&request.prompt).await?;
    Ok(Json(response))
}

/// `GET /music/:task_id`
pub async fn get_music(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<MusicResponse>, AppError> {
    let response = state.relay.lookup(&task_id).await?;
    Ok(Json(response))
}
