use crate::link::LinkState;
use thiserror::Error;

/// Failure reported by a `PeerTransport` or `TransportFactory`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0} did not complete in time")]
    Timeout(&'static str),

    #[error("transport was closed by the remote side: {0}")]
    Disconnected(String),

    #[error("webrtc: {0}")]
    Rtc(String),
}

impl TransportError {
    pub fn rtc(err: impl std::fmt::Display) -> Self {
        TransportError::Rtc(err.to_string())
    }
}

/// Capture-device failures. All of them are recoverable: the previously
/// active source stays in place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("permission to open {0} was denied")]
    PermissionDenied(String),

    #[error("{0} is unavailable")]
    Unavailable(String),

    #[error("capture device did not respond in time")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("negotiation did not finish in time")]
    NegotiationTimeout,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected {signal} while {state:?}")]
    UnexpectedSignal {
        signal: &'static str,
        state: LinkState,
    },

    #[error("remote ICE candidate rejected: {0}")]
    RejectedCandidate(TransportError),
}

impl LinkError {
    /// Fatal errors close the link; the rest are logged and ignored.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::NegotiationTimeout | LinkError::Transport(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("signaling channel is closed")]
    Signaling(#[from] SignalingClosed),

    #[error("call engine has stopped")]
    Stopped,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("signaling channel is closed")]
pub struct SignalingClosed;
