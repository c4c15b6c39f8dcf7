use meshcall_core::{RoomId, UserId};
use thiserror::Error;

/// Non-fatal routing outcomes. None of these close the sender's connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("user {target} is not in room {room_id}")]
    TargetNotFound { room_id: RoomId, target: UserId },

    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("connection has not joined a room")]
    NotJoined,

    #[error("room {0} closed while the request was queued")]
    RoomClosed(RoomId),

    #[error("room {0} was rejected by the room directory")]
    RoomRejected(RoomId),

    #[error("invalid join request: {0}")]
    InvalidJoin(String),
}

impl RoutingError {
    pub fn code(&self) -> &'static str {
        match self {
            RoutingError::TargetNotFound { .. } => "target_not_found",
            RoutingError::RoomNotFound(_) => "room_not_found",
            RoutingError::NotJoined => "not_joined",
            RoutingError::RoomClosed(_) => "room_closed",
            RoutingError::RoomRejected(_) => "room_rejected",
            RoutingError::InvalidJoin(_) => "invalid_join",
        }
    }
}
