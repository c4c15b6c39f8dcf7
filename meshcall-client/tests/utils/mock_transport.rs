use async_trait::async_trait;
use meshcall_client::{
    LinkId, MediaTrack, PeerTransport, RemoteTrack, SdpKind, TrackKind, TransportError,
    TransportEvent, TransportFactory, TransportRequest,
};
use meshcall_core::UserId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    CreateOffer,
    CreateAnswer,
    RemoteDescription(SdpKind),
    Candidate(String),
    ReplaceTrack(String),
    Close,
}

/// One transport the factory handed out.
#[derive(Clone)]
pub struct MockLink {
    pub link_id: LinkId,
    pub remote: UserId,
    pub initial_tracks: Vec<String>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
    events: mpsc::Sender<TransportEvent>,
}

impl MockLink {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_closed(&self) -> bool {
        self.calls().contains(&TransportCall::Close)
    }

    pub fn replaced_tracks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::ReplaceTrack(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Simulates the remote side's media arriving on this link.
    pub async fn deliver_track(&self, kind: TrackKind, track_id: &str) {
        let track = RemoteTrack::new(track_id, format!("stream-{}", self.remote), kind);
        self.events
            .send(TransportEvent::RemoteTrack(self.link_id, track))
            .await
            .unwrap();
    }

    /// Simulates the peer connection failing underneath the link.
    pub async fn fail(&self, reason: &str) {
        self.events
            .send(TransportEvent::Disconnected(self.link_id, reason.to_string()))
            .await
            .unwrap();
    }
}

#[derive(Default)]
struct FactoryState {
    links: Vec<MockLink>,
    manual_connect: bool,
    fail_replace_for: HashSet<UserId>,
}

/// Records every transport it creates. By default a transport reports
/// `Connected` as soon as both descriptions are in place.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockTransportFactory {
    /// Transports never report `Connected` on their own.
    pub fn set_manual_connect(&self, manual: bool) {
        self.state.lock().unwrap().manual_connect = manual;
    }

    pub fn fail_replace_for(&self, user: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_replace_for
            .insert(UserId::from(user));
    }

    pub fn links(&self) -> Vec<MockLink> {
        self.state.lock().unwrap().links.clone()
    }

    pub fn links_to(&self, user: &str) -> Vec<MockLink> {
        let user = UserId::from(user);
        self.links()
            .into_iter()
            .filter(|l| l.remote == user)
            .collect()
    }

    /// The most recent transport to `user`.
    pub fn link_to(&self, user: &str) -> MockLink {
        self.links_to(user)
            .pop()
            .unwrap_or_else(|| panic!("No transport was created for {}", user))
    }

    pub fn total(&self, call: &TransportCall) -> usize {
        self.links().iter().map(|l| l.count(call)).sum()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        request: TransportRequest,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let mut state = self.state.lock().unwrap();
        let link = MockLink {
            link_id: request.link_id,
            remote: request.remote_user_id.clone(),
            initial_tracks: request.tracks.iter().map(|t| t.id().to_string()).collect(),
            calls: Arc::default(),
            events: request.events.clone(),
        };
        state.links.push(link.clone());

        Ok(Box::new(MockTransport {
            auto_connect: !state.manual_connect,
            fail_replace: state.fail_replace_for.contains(&request.remote_user_id),
            link,
        }))
    }
}

struct MockTransport {
    link: MockLink,
    auto_connect: bool,
    fail_replace: bool,
}

impl MockTransport {
    fn record(&self, call: TransportCall) {
        self.link.calls.lock().unwrap().push(call);
    }

    async fn emit(&self, event: TransportEvent) {
        let _ = self.link.events.send(event).await;
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<String, TransportError> {
        self.record(TransportCall::CreateOffer);
        self.emit(TransportEvent::CandidateGenerated(
            self.link.link_id,
            format!("candidate:{}", self.link.link_id),
        ))
        .await;
        Ok(format!("offer from {}", self.link.link_id))
    }

    async fn create_answer(&self) -> Result<String, TransportError> {
        self.record(TransportCall::CreateAnswer);
        if self.auto_connect {
            self.emit(TransportEvent::Connected(self.link.link_id)).await;
        }
        Ok(format!("answer from {}", self.link.link_id))
    }

    async fn apply_remote_description(
        &self,
        kind: SdpKind,
        _sdp: String,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::RemoteDescription(kind));
        if kind == SdpKind::Answer && self.auto_connect {
            self.emit(TransportEvent::Connected(self.link.link_id)).await;
        }
        Ok(())
    }

    async fn add_remote_ice_candidate(&self, candidate: String) -> Result<(), TransportError> {
        self.record(TransportCall::Candidate(candidate));
        Ok(())
    }

    async fn replace_outgoing_track(&self, track: MediaTrack) -> Result<(), TransportError> {
        if self.fail_replace {
            return Err(TransportError::Rtc("sender is gone".to_string()));
        }
        self.record(TransportCall::ReplaceTrack(track.id().to_string()));
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.record(TransportCall::Close);
        Ok(())
    }
}
