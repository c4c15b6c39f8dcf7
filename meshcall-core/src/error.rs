use thiserror::Error;

/// Reasons a signaling frame is rejected before it reaches any other peer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("frame is not a valid client message: {0}")]
    Undecodable(String),

    #[error("target user id is empty")]
    EmptyTarget,

    #[error("envelope targets its own sender")]
    SelfTarget,

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl EnvelopeError {
    /// Stable machine-readable code sent back in `ServerMessage::Error`.
    pub fn code(&self) -> &'static str {
        match self {
            EnvelopeError::Undecodable(_) => "undecodable",
            EnvelopeError::EmptyTarget => "empty_target",
            EnvelopeError::SelfTarget => "self_target",
            EnvelopeError::EmptyPayload => "empty_payload",
            EnvelopeError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}
