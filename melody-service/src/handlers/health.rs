use crate::dtos::{HealthResponse, HomeResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};

/// `GET /` liveness message.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Backend is working!",
    })
}

/// `GET /health` reports upstream reachability.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        suno_status: state.relay.health().await,
    })
}
