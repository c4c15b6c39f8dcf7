use crate::media::TrackKind;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Tags one transport instance. A new link for the same remote user gets a
/// new id, so late events from a closed transport are recognisable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// A track received from the remote side.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    pub handle: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, stream_id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
            handle: None,
        }
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for RemoteTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.stream_id == other.stream_id && self.kind == other.kind
    }
}

/// Events a transport emits for the engine loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Media can flow.
    Connected(LinkId),

    /// The session failed or was closed from the other side.
    Disconnected(LinkId, String),

    RemoteTrack(LinkId, RemoteTrack),

    /// A local ICE candidate that has to reach the remote user via signaling.
    CandidateGenerated(LinkId, String),
}

impl TransportEvent {
    pub fn link_id(&self) -> LinkId {
        match self {
            TransportEvent::Connected(id)
            | TransportEvent::Disconnected(id, _)
            | TransportEvent::RemoteTrack(id, _)
            | TransportEvent::CandidateGenerated(id, _) => *id,
        }
    }
}
