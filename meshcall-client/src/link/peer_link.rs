use crate::error::{LinkError, TransportError};
use crate::link::link_state::LinkState;
use crate::media::MediaTrack;
use crate::presence::Role;
use crate::transport::{LinkId, PeerTransport, SdpKind};
use meshcall_core::{ClientMessage, UserId};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One negotiated session with a remote user.
///
/// Every transport call is bounded by `operation_timeout`; a timed-out or
/// failed call surfaces as a fatal `LinkError::Transport`.
pub struct PeerLink {
    id: LinkId,
    remote: UserId,
    role: Role,
    state: LinkState,
    transport: Box<dyn PeerTransport>,
    remote_description_set: bool,
    pending_candidates: Vec<String>,
    operation_timeout: Duration,
}

impl PeerLink {
    pub fn new(
        id: LinkId,
        remote: UserId,
        role: Role,
        transport: Box<dyn PeerTransport>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            id,
            remote,
            role,
            state: LinkState::Idle,
            transport,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            operation_timeout,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn remote(&self) -> &UserId {
        &self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Initiators create and return the offer; responders wait in `Idle`.
    pub async fn start(&mut self) -> Result<Option<ClientMessage>, LinkError> {
        if self.role == Role::Responder || self.state != LinkState::Idle {
            return Ok(None);
        }

        let sdp = self
            .guarded("create_offer", self.transport.create_offer())
            .await?;
        self.transition(LinkState::Negotiating);
        Ok(Some(ClientMessage::Offer {
            target_user_id: self.remote.clone(),
            sdp,
        }))
    }

    /// Responder side: apply the offer and produce the answer.
    pub async fn on_offer(&mut self, sdp: String) -> Result<ClientMessage, LinkError> {
        if self.role != Role::Responder || self.state != LinkState::Idle {
            return Err(LinkError::UnexpectedSignal {
                signal: "offer",
                state: self.state,
            });
        }

        self.guarded(
            "apply_remote_description",
            self.transport.apply_remote_description(SdpKind::Offer, sdp),
        )
        .await?;
        self.transition(LinkState::Negotiating);
        self.remote_description_set = true;
        self.flush_candidates().await;

        let answer = self
            .guarded("create_answer", self.transport.create_answer())
            .await?;
        self.transition(LinkState::Connecting);
        Ok(ClientMessage::Answer {
            target_user_id: self.remote.clone(),
            sdp: answer,
        })
    }

    /// Initiator side: apply the answer to our offer.
    pub async fn on_answer(&mut self, sdp: String) -> Result<(), LinkError> {
        if self.role != Role::Initiator || self.state != LinkState::Negotiating {
            return Err(LinkError::UnexpectedSignal {
                signal: "answer",
                state: self.state,
            });
        }

        self.guarded(
            "apply_remote_description",
            self.transport.apply_remote_description(SdpKind::Answer, sdp),
        )
        .await?;
        self.remote_description_set = true;
        self.transition(LinkState::Connecting);
        self.flush_candidates().await;
        Ok(())
    }

    /// Candidates that arrive before the remote description are buffered
    /// and applied in arrival order once it is set.
    pub async fn on_candidate(&mut self, candidate: String) -> Result<(), LinkError> {
        if self.state == LinkState::Closed {
            return Err(LinkError::UnexpectedSignal {
                signal: "ice candidate",
                state: self.state,
            });
        }

        if !self.remote_description_set {
            debug!(
                "Buffering ICE candidate for {} until the remote description is set",
                self.remote
            );
            self.pending_candidates.push(candidate);
            return Ok(());
        }

        self.guarded(
            "add_remote_ice_candidate",
            self.transport.add_remote_ice_candidate(candidate),
        )
        .await
        .map_err(|e| match e {
            LinkError::Transport(inner) => LinkError::RejectedCandidate(inner),
            other => other,
        })
    }

    /// Returns `true` if the link moved to `Connected`.
    pub fn on_connected(&mut self) -> bool {
        match self.state {
            LinkState::Negotiating | LinkState::Connecting => {
                self.transition(LinkState::Connected);
                true
            }
            _ => false,
        }
    }

    pub async fn replace_video(&self, track: MediaTrack) -> Result<(), LinkError> {
        self.guarded(
            "replace_outgoing_track",
            self.transport.replace_outgoing_track(track),
        )
        .await
    }

    /// Releases the transport. Errors are logged; the link is closed either way.
    pub async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.transition(LinkState::Closed);
        self.pending_candidates.clear();

        if let Err(e) = self.guarded("close", self.transport.close()).await {
            warn!("Closing link to {} failed: {}", self.remote, e);
        }
    }

    async fn flush_candidates(&mut self) {
        let pending = std::mem::take(&mut self.pending_candidates);
        if !pending.is_empty() {
            debug!(
                "Applying {} buffered ICE candidates for {}",
                pending.len(),
                self.remote
            );
        }

        for candidate in pending {
            if let Err(e) = self
                .guarded(
                    "add_remote_ice_candidate",
                    self.transport.add_remote_ice_candidate(candidate),
                )
                .await
            {
                warn!("Buffered ICE candidate for {} rejected: {}", self.remote, e);
            }
        }
    }

    fn transition(&mut self, next: LinkState) {
        if !self.state.can_advance_to(next) {
            warn!(
                "Refusing link transition {:?} -> {:?} for {}",
                self.state, next, self.remote
            );
            return;
        }
        info!(
            "Link {} to {} ({:?}): {:?} -> {:?}",
            self.id, self.remote, self.role, self.state, next
        );
        self.state = next;
    }

    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> Result<T, LinkError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(LinkError::from),
            Err(_) => Err(LinkError::Transport(TransportError::Timeout(op))),
        }
    }
}
