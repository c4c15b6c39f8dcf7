use crate::error::EnvelopeError;
use crate::model::signaling::ServerMessage;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// A targeted negotiation payload. The router never looks inside `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub kind: SignalKind,
    pub sender_user_id: UserId,
    pub target_user_id: UserId,
    pub payload: String,
}

impl SignalEnvelope {
    /// Shape check only: addressing and payload size.
    pub fn validate(&self, max_payload_bytes: usize) -> Result<(), EnvelopeError> {
        if self.target_user_id.is_empty() {
            return Err(EnvelopeError::EmptyTarget);
        }
        if self.target_user_id == self.sender_user_id {
            return Err(EnvelopeError::SelfTarget);
        }
        if self.payload.is_empty() {
            return Err(EnvelopeError::EmptyPayload);
        }
        if self.payload.len() > max_payload_bytes {
            return Err(EnvelopeError::PayloadTooLarge {
                size: self.payload.len(),
                limit: max_payload_bytes,
            });
        }
        Ok(())
    }
}

impl From<SignalEnvelope> for ServerMessage {
    fn from(envelope: SignalEnvelope) -> Self {
        let sender_user_id = envelope.sender_user_id;
        match envelope.kind {
            SignalKind::Offer => ServerMessage::Offer {
                sender_user_id,
                sdp: envelope.payload,
            },
            SignalKind::Answer => ServerMessage::Answer {
                sender_user_id,
                sdp: envelope.payload,
            },
            SignalKind::IceCandidate => ServerMessage::IceCandidate {
                sender_user_id,
                candidate: envelope.payload,
            },
        }
    }
}
