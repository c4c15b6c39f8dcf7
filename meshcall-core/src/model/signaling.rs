use crate::error::EnvelopeError;
use crate::model::envelope::{SignalEnvelope, SignalKind};
use crate::model::media::MediaStateEvent;
use crate::model::participant::Participant;
use crate::model::room::RoomId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Frames a client sends to the signaling server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
        user_id: UserId,
        display_name: String,
    },
    LeaveRoom,
    Offer {
        target_user_id: UserId,
        sdp: String,
    },
    Answer {
        target_user_id: UserId,
        sdp: String,
    },
    IceCandidate {
        target_user_id: UserId,
        candidate: String,
    },
    ToggleAudio {
        enabled: bool,
    },
    ToggleVideo {
        enabled: bool,
    },
    ScreenShareState {
        enabled: bool,
    },
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(|e| EnvelopeError::Undecodable(e.to_string()))
    }

    /// Splits a targeted signaling frame into an envelope stamped with the
    /// sender identity. Returns `None` for every other frame.
    pub fn into_envelope(self, sender_user_id: UserId) -> Option<SignalEnvelope> {
        let (kind, target_user_id, payload) = match self {
            ClientMessage::Offer {
                target_user_id,
                sdp,
            } => (SignalKind::Offer, target_user_id, sdp),
            ClientMessage::Answer {
                target_user_id,
                sdp,
            } => (SignalKind::Answer, target_user_id, sdp),
            ClientMessage::IceCandidate {
                target_user_id,
                candidate,
            } => (SignalKind::IceCandidate, target_user_id, candidate),
            _ => return None,
        };

        Some(SignalEnvelope {
            kind,
            sender_user_id,
            target_user_id,
            payload,
        })
    }
}

/// Frames the signaling server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    RosterSnapshot {
        room_id: RoomId,
        participants: Vec<Participant>,
    },
    PresenceJoined {
        user_id: UserId,
        display_name: String,
    },
    PresenceLeft {
        user_id: UserId,
    },
    Offer {
        sender_user_id: UserId,
        sdp: String,
    },
    Answer {
        sender_user_id: UserId,
        sdp: String,
    },
    IceCandidate {
        sender_user_id: UserId,
        candidate: String,
    },
    MediaState(MediaStateEvent),
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Reassembles an inbound relayed frame into an envelope addressed to
    /// `local`. Returns `None` for frames that are not relayed signals.
    pub fn into_envelope(self, local: &UserId) -> Option<SignalEnvelope> {
        let (kind, sender_user_id, payload) = match self {
            ServerMessage::Offer {
                sender_user_id,
                sdp,
            } => (SignalKind::Offer, sender_user_id, sdp),
            ServerMessage::Answer {
                sender_user_id,
                sdp,
            } => (SignalKind::Answer, sender_user_id, sdp),
            ServerMessage::IceCandidate {
                sender_user_id,
                candidate,
            } => (SignalKind::IceCandidate, sender_user_id, candidate),
            _ => return None,
        };

        Some(SignalEnvelope {
            kind,
            sender_user_id,
            target_user_id: local.clone(),
            payload,
        })
    }
}
