use crate::SignalingService;
use crate::signaling::ws_handler;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use meshcall_core::{Participant, RoomId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RoomDetails {
    pub room_id: RoomId,
    pub participants: Vec<Participant>,
}

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms/{room_id}", get(room_details))
        .route("/health", get(health))
        .with_state(service)
}

async fn room_details(
    Path(room_id): Path<String>,
    State(service): State<SignalingService>,
) -> Result<Json<RoomDetails>, StatusCode> {
    let room_id = RoomId::from(room_id);
    let participants = service
        .rooms()
        .participants(&room_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(RoomDetails {
        room_id,
        participants,
    }))
}

async fn health() -> &'static str {
    "ok"
}
