use crate::signaling::Outbound;
use meshcall_core::{ConnectionId, RoomId, ServerMessage, UserId};
use tracing::error;

/// Server-side state of one signaling connection.
#[derive(Debug)]
pub struct Session {
    pub connection_id: ConnectionId,
    outbound: Outbound,
    joined: Option<JoinedRoom>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    pub room_id: RoomId,
    pub user_id: UserId,
}

impl Session {
    pub(crate) fn new(outbound: Outbound) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            outbound,
            joined: None,
        }
    }

    pub fn joined(&self) -> Option<&JoinedRoom> {
        self.joined.as_ref()
    }

    pub(crate) fn set_joined(&mut self, joined: Option<JoinedRoom>) {
        self.joined = joined;
    }

    pub(crate) fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub(crate) fn reply(&self, msg: ServerMessage) {
        if self.outbound.send(msg).is_err() {
            error!(
                "Failed to queue reply for connection {}: writer is gone",
                self.connection_id
            );
        }
    }
}
