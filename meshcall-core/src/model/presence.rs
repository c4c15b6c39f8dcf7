use crate::model::participant::Participant;
use crate::model::signaling::ServerMessage;
use crate::model::user::UserId;

/// Untargeted membership notification fanned out to the rest of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Joined(Participant),
    Left(UserId),
}

impl PresenceEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            PresenceEvent::Joined(p) => &p.user_id,
            PresenceEvent::Left(user_id) => user_id,
        }
    }
}

impl From<PresenceEvent> for ServerMessage {
    fn from(event: PresenceEvent) -> Self {
        match event {
            PresenceEvent::Joined(p) => ServerMessage::PresenceJoined {
                user_id: p.user_id,
                display_name: p.display_name,
            },
            PresenceEvent::Left(user_id) => ServerMessage::PresenceLeft { user_id },
        }
    }
}
