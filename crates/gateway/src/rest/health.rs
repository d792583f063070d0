use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Rooms with at least one live connection.
    pub rooms: usize,
}

pub async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        rooms: state.hub.registry().room_count(),
    })
}
