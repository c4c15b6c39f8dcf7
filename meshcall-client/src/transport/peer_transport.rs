use crate::error::TransportError;
use crate::media::MediaTrack;
use crate::transport::transport_event::{LinkId, TransportEvent};
use async_trait::async_trait;
use meshcall_core::{IceServerConfig, UserId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Everything a factory needs to build one peer session.
pub struct TransportRequest {
    pub link_id: LinkId,
    pub remote_user_id: UserId,
    pub ice_servers: Vec<IceServerConfig>,
    /// Outgoing tracks, at most one per kind.
    pub tracks: Vec<MediaTrack>,
    pub events: mpsc::Sender<TransportEvent>,
}

/// One point-to-point media session. Offer and answer calls also install the
/// result as the local description.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String, TransportError>;

    async fn create_answer(&self) -> Result<String, TransportError>;

    async fn apply_remote_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), TransportError>;

    async fn add_remote_ice_candidate(&self, candidate: String) -> Result<(), TransportError>;

    /// Swaps the outgoing track of the same kind in place, without a new
    /// offer/answer round.
    async fn replace_outgoing_track(&self, track: MediaTrack) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(&self, request: TransportRequest)
    -> Result<Box<dyn PeerTransport>, TransportError>;
}
