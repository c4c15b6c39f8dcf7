use crate::error::TransportError;
use crate::media::{MediaTrack, TrackKind};
use crate::transport::peer_transport::{PeerTransport, SdpKind, TransportFactory, TransportRequest};
use crate::transport::transport_event::{LinkId, RemoteTrack, TransportEvent};
use async_trait::async_trait;
use meshcall_core::IceServerConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;

/// Builds `RtcTransport`s backed by the `webrtc` crate.
#[derive(Debug, Clone, Default)]
pub struct RtcTransportFactory;

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        request: TransportRequest,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let transport = RtcTransport::new(request).await?;
        Ok(Box::new(transport))
    }
}

pub struct RtcTransport {
    link_id: LinkId,
    peer_connection: Arc<RTCPeerConnection>,
    senders: HashMap<TrackKind, Arc<RTCRtpSender>>,
}

impl RtcTransport {
    pub async fn new(request: TransportRequest) -> Result<Self, TransportError> {
        let TransportRequest {
            link_id,
            remote_user_id,
            ice_servers,
            tracks,
            events,
        } = request;

        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(TransportError::rtc)?;
        let registry =
            register_default_interceptors(Registry::new(), &mut m).map_err(TransportError::rtc)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(TransportError::rtc)?,
        );

        let mut senders = HashMap::new();
        for track in &tracks {
            let sender = peer_connection
                .add_track(track.rtc_track())
                .await
                .map_err(TransportError::rtc)?;
            drain_rtcp(sender.clone());
            senders.insert(track.kind(), sender);
        }

        register_callbacks(&peer_connection, link_id, events);
        info!(
            "Created peer connection {} to {} with {} outgoing tracks",
            link_id,
            remote_user_id,
            senders.len()
        );

        Ok(Self {
            link_id,
            peer_connection,
            senders,
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String, TransportError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(TransportError::rtc)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(TransportError::rtc)?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, TransportError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(TransportError::rtc)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(TransportError::rtc)?;
        Ok(answer.sdp)
    }

    async fn apply_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), TransportError> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp),
            SdpKind::Answer => RTCSessionDescription::answer(sdp),
        }
        .map_err(TransportError::rtc)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(TransportError::rtc)
    }

    async fn add_remote_ice_candidate(&self, candidate: String) -> Result<(), TransportError> {
        // Browsers send the JSON form, other peers may send the bare line.
        let init = match serde_json::from_str::<RTCIceCandidateInit>(&candidate) {
            Ok(init) => init,
            Err(_) => RTCIceCandidateInit {
                candidate,
                ..Default::default()
            },
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(TransportError::rtc)
    }

    async fn replace_outgoing_track(&self, track: MediaTrack) -> Result<(), TransportError> {
        let sender = self.senders.get(&track.kind()).ok_or_else(|| {
            TransportError::Rtc(format!("no outgoing {:?} sender", track.kind()))
        })?;
        sender
            .replace_track(Some(track.rtc_track()))
            .await
            .map_err(TransportError::rtc)?;
        debug!("Replaced outgoing {:?} track on {}", track.kind(), self.link_id);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection
            .close()
            .await
            .map_err(TransportError::rtc)
    }
}

fn rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

/// RTCP has to be read for interceptors such as NACK to work.
fn drain_rtcp(sender: Arc<RTCRtpSender>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 1500];
        while sender.read(&mut buf).await.is_ok() {}
    });
}

/// ICE may recover from `Disconnected` on its own and moves on to `Failed`
/// if it cannot, so only `Failed` and `Closed` end the link.
fn state_event(link_id: LinkId, state: RTCPeerConnectionState) -> Option<TransportEvent> {
    match state {
        RTCPeerConnectionState::Connected => Some(TransportEvent::Connected(link_id)),
        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed => {
            Some(TransportEvent::Disconnected(link_id, state.to_string()))
        }
        RTCPeerConnectionState::Disconnected => {
            warn!("{} lost connectivity; waiting for ICE to recover", link_id);
            None
        }
        _ => None,
    }
}

fn register_callbacks(
    peer_connection: &Arc<RTCPeerConnection>,
    link_id: LinkId,
    events: mpsc::Sender<TransportEvent>,
) {
    let state_tx = events.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();

            Box::pin(async move {
                info!("Peer connection state of {} changed: {:?}", link_id, s);
                let Some(event) = state_event(link_id, s) else {
                    return;
                };
                if tx.send(event).await.is_err() {
                    debug!("Engine gone; dropping state change of {}", link_id);
                }
            })
        },
    ));

    let ice_tx = events.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();

        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(json_candidate) = candidate.to_json() else {
                return;
            };
            let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                return;
            };
            let _ = tx
                .send(TransportEvent::CandidateGenerated(link_id, str_candidate))
                .await;
        })
    }));

    let track_tx = events;
    peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
        let tx = track_tx.clone();

        Box::pin(async move {
            let kind = match track.kind() {
                RTPCodecType::Audio => TrackKind::Audio,
                _ => TrackKind::Video,
            };
            let remote = RemoteTrack {
                id: track.id(),
                stream_id: track.stream_id(),
                kind,
                handle: Some(track),
            };
            if tx.send(TransportEvent::RemoteTrack(link_id, remote)).await.is_err() {
                warn!("Engine gone; dropping remote track on {}", link_id);
            }
        })
    }));
}
