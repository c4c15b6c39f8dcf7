use crate::config::CallConfig;
use crate::engine::call_event::CallEvent;
use crate::engine::call_handle::CallHandle;
use crate::engine::engine_command::{EngineCommand, InternalEvent};
use crate::error::{DeviceError, EngineError, LinkError, TransportError};
use crate::link::{LinkState, PeerDirectory, PeerLink};
use crate::media::{CaptureDevices, LocalMediaState, MediaController, MediaTrack, TrackEnd};
use crate::presence::{PresenceAction, PresenceReconciler, Role};
use crate::signaling::SignalingSink;
use crate::transport::{LinkId, TransportEvent, TransportFactory, TransportRequest};
use futures::future::join_all;
use meshcall_core::{
    CaptureSource, ClientMessage, IceServerConfig, Participant, RoomId, ServerMessage, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// External collaborators of a call.
#[derive(Clone)]
pub struct CallDeps {
    pub signaling: Arc<dyn SignalingSink>,
    pub transports: Arc<dyn TransportFactory>,
    pub devices: Arc<dyn CaptureDevices>,
}

/// Client actor for one room. Presence, relayed signals, transport
/// callbacks and local actions all pass through `run`, one at a time, so
/// the link set and local media never see interleaved updates.
pub struct CallEngine {
    config: CallConfig,
    room_id: RoomId,
    local: Participant,
    signaling: Arc<dyn SignalingSink>,
    transports: Arc<dyn TransportFactory>,
    ice_servers: Vec<IceServerConfig>,

    media: MediaController,
    presence: PresenceReconciler,
    links: HashMap<UserId, PeerLink>,
    peers: PeerDirectory,
    local_tx: watch::Sender<LocalMediaState>,
    next_link_id: u64,

    commands: mpsc::UnboundedReceiver<EngineCommand>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    events: mpsc::UnboundedSender<CallEvent>,
}

impl CallEngine {
    /// Opens local media, sends `JoinRoom` and starts the engine task.
    /// `server_rx` carries every frame the signaling server pushes to this
    /// connection, starting with `IceConfig` if it has not been consumed.
    pub async fn join(
        config: CallConfig,
        room_id: RoomId,
        local: Participant,
        deps: CallDeps,
        server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Result<CallHandle, EngineError> {
        let media = MediaController::open(deps.devices, config.operation_timeout).await?;

        if let Err(e) = deps.signaling.send(ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            user_id: local.user_id.clone(),
            display_name: local.display_name.clone(),
        }) {
            media.stop_all();
            return Err(e.into());
        }
        info!("User {} is joining room '{}'", local.user_id, room_id);

        let (command_tx, commands) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::channel(config.transport_event_capacity);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (local_tx, local_rx) = watch::channel(media.state());
        let peers = PeerDirectory::new();
        let peers_rx = peers.subscribe();

        let engine = CallEngine {
            ice_servers: config.ice_servers.clone(),
            config,
            room_id,
            presence: PresenceReconciler::new(local.user_id.clone()),
            local,
            signaling: deps.signaling,
            transports: deps.transports,
            media,
            links: HashMap::new(),
            peers,
            local_tx,
            next_link_id: 0,
            commands,
            server_rx,
            transport_tx,
            transport_rx,
            internal_tx,
            internal_rx,
            events: event_tx,
        };

        let task = tokio::spawn(engine.run());
        Ok(CallHandle::new(command_tx, events, peers_rx, local_rx, task))
    }

    async fn run(mut self) {
        info!("Call engine for {} started", self.local.user_id);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(EngineCommand::Leave { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        info!("Every call handle was dropped; leaving '{}'", self.room_id);
                        self.shutdown().await;
                        break;
                    }
                },

                msg = self.server_rx.recv() => match msg {
                    Some(msg) => self.handle_server_message(msg).await,
                    None => {
                        warn!("Signaling channel for '{}' closed", self.room_id);
                        self.emit(CallEvent::Disconnected);
                        self.shutdown().await;
                        break;
                    }
                },

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }

                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal_event(event).await;
                }
            }
        }

        info!("Call engine for {} finished", self.local.user_id);
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SetAudio { enabled, reply } => {
                if self.media.set_audio_enabled(enabled) {
                    self.send(ClientMessage::ToggleAudio { enabled });
                    self.publish_local();
                }
                let _ = reply.send(());
            }

            EngineCommand::SetVideo { enabled, reply } => {
                // Video was turned off because its source died; it comes
                // back on a freshly opened camera.
                if enabled
                    && !self.media.video_track().is_live()
                    && self.replace_video_source(CaptureSource::Camera).await.is_err()
                {
                    let _ = reply.send(());
                    return;
                }
                if self.media.set_video_enabled(enabled) {
                    self.send(ClientMessage::ToggleVideo { enabled });
                    self.publish_local();
                }
                let _ = reply.send(());
            }

            EngineCommand::SwitchSource { source, reply } => {
                let result = self.switch_source(source).await;
                let _ = reply.send(result);
            }

            // Handled in `run`, which has to stop the loop.
            EngineCommand::Leave { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::IceConfig { ice_servers } => {
                debug!("Received {} ICE servers", ice_servers.len());
                self.ice_servers = ice_servers;
            }

            ServerMessage::RosterSnapshot {
                room_id,
                participants,
            } => {
                info!(
                    "Joined '{}' with {} existing members",
                    room_id,
                    participants.len()
                );
                let actions = self.presence.roster(&participants);
                self.emit(CallEvent::Joined {
                    room_id,
                    participants,
                });
                for action in actions {
                    self.apply_presence(action).await;
                }
            }

            ServerMessage::PresenceJoined {
                user_id,
                display_name,
            } => {
                if let Some(action) = self.presence.joined(&user_id, &display_name) {
                    self.emit(CallEvent::PeerJoined {
                        user_id,
                        display_name,
                    });
                    self.apply_presence(action).await;
                }
            }

            ServerMessage::PresenceLeft { user_id } => match self.presence.left(&user_id) {
                Some(action) => {
                    self.apply_presence(action).await;
                    self.emit(CallEvent::PeerLeft { user_id });
                }
                None => {
                    debug!("Left for unknown user {}", user_id);
                    self.peers.remove(&user_id);
                }
            },

            ServerMessage::Offer {
                sender_user_id,
                sdp,
            } => self.handle_offer(sender_user_id, sdp).await,

            ServerMessage::Answer {
                sender_user_id,
                sdp,
            } => {
                let Some(link) = self.links.get_mut(&sender_user_id) else {
                    warn!("Answer from {} without a link; ignoring", sender_user_id);
                    return;
                };
                let result = link.on_answer(sdp).await;
                self.after_link_call(&sender_user_id, result).await;
            }

            ServerMessage::IceCandidate {
                sender_user_id,
                candidate,
            } => {
                let Some(link) = self.links.get_mut(&sender_user_id) else {
                    warn!("ICE candidate from {} without a link; ignoring", sender_user_id);
                    return;
                };
                let result = link.on_candidate(candidate).await;
                self.after_link_call(&sender_user_id, result).await;
            }

            ServerMessage::MediaState(event) => {
                if event.user_id != self.local.user_id {
                    debug!("Media state of {}: {:?}", event.user_id, event);
                    self.peers.apply_media(event);
                }
            }

            ServerMessage::Error { code, message } => {
                warn!("Signaling server reported {}: {}", code, message);
                self.emit(CallEvent::ServerError { code, message });
            }
        }
    }

    async fn handle_offer(&mut self, sender: UserId, sdp: String) {
        if !self.links.contains_key(&sender) {
            if Role::for_pair(&self.local.user_id, &sender) != Role::Responder {
                warn!(
                    "Offer from {} although {} initiates that pair; ignoring",
                    sender, self.local.user_id
                );
                return;
            }

            let action = match self.presence.display_name(&sender) {
                Some(name) => PresenceAction::Open {
                    user_id: sender.clone(),
                    display_name: name.to_string(),
                    role: Role::Responder,
                },
                None => match self.presence.offer_from_unknown(&sender) {
                    Some(action) => action,
                    None => return,
                },
            };
            self.apply_presence(action).await;
        }

        let Some(link) = self.links.get_mut(&sender) else {
            return;
        };
        let result = link.on_offer(sdp).await;
        match result {
            Ok(answer) => {
                self.send(answer);
                self.sync_link_state(&sender);
            }
            Err(e) => self.handle_link_error(&sender, e).await,
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let link_id = event.link_id();
        let Some(user_id) = self.user_for_link(link_id) else {
            debug!("Ignoring {:?} from a closed transport", event);
            return;
        };

        match event {
            TransportEvent::Connected(_) => {
                if let Some(link) = self.links.get_mut(&user_id) {
                    link.on_connected();
                }
                self.sync_link_state(&user_id);
            }

            TransportEvent::Disconnected(_, reason) => {
                self.fail_link(
                    &user_id,
                    LinkError::Transport(TransportError::Disconnected(reason)),
                )
                .await;
            }

            TransportEvent::RemoteTrack(_, track) => {
                info!("Remote {:?} track {} from {}", track.kind, track.id, user_id);
                self.peers.add_remote_track(&user_id, track);
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                self.send(ClientMessage::IceCandidate {
                    target_user_id: user_id,
                    candidate,
                });
            }
        }
    }

    async fn handle_internal_event(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::NegotiationDeadline(link_id) => {
                let Some(user_id) = self.user_for_link(link_id) else {
                    return;
                };
                let connected = self
                    .links
                    .get(&user_id)
                    .is_some_and(|link| link.state() == LinkState::Connected);
                if !connected {
                    self.fail_link(&user_id, LinkError::NegotiationTimeout).await;
                }
            }

            InternalEvent::ScreenEnded { track_id } => {
                if self.media.source() != CaptureSource::Screen
                    || self.media.video_track().id() != track_id
                {
                    debug!("Stale end notification for track {}", track_id);
                    return;
                }
                info!("Screen capture ended externally; reverting to camera");
                if self.switch_source(CaptureSource::Camera).await.is_err() {
                    self.media.fall_back_without_video();
                    self.send(ClientMessage::ScreenShareState { enabled: false });
                    self.send(ClientMessage::ToggleVideo { enabled: false });
                    self.publish_local();
                    self.emit(CallEvent::SourceChanged {
                        source: CaptureSource::Camera,
                    });
                }
            }
        }
    }

    async fn apply_presence(&mut self, action: PresenceAction) {
        match action {
            PresenceAction::Open {
                user_id,
                display_name,
                role,
            } => self.open_link(user_id, display_name, role).await,

            PresenceAction::Close { user_id } => {
                if let Some(mut link) = self.links.remove(&user_id) {
                    link.close().await;
                }
                self.peers.remove(&user_id);
                info!("Removed {} from the call", user_id);
            }
        }
    }

    async fn open_link(&mut self, user_id: UserId, display_name: String, role: Role) {
        if self.links.contains_key(&user_id) {
            debug!("Link to {} already exists; ignoring duplicate request", user_id);
            return;
        }

        self.peers.insert(&user_id, &display_name);
        self.next_link_id += 1;
        let link_id = LinkId(self.next_link_id);

        let request = TransportRequest {
            link_id,
            remote_user_id: user_id.clone(),
            ice_servers: self.ice_servers.clone(),
            tracks: self.media.tracks(),
            events: self.transport_tx.clone(),
        };
        let created =
            tokio::time::timeout(self.config.operation_timeout, self.transports.create(request))
                .await
                .unwrap_or(Err(TransportError::Timeout("create_transport")));
        let transport = match created {
            Ok(transport) => transport,
            Err(e) => {
                self.report_link_failure(&user_id, LinkError::Transport(e));
                return;
            }
        };

        let mut link = PeerLink::new(
            link_id,
            user_id.clone(),
            role,
            transport,
            self.config.operation_timeout,
        );
        self.arm_negotiation_deadline(link_id);

        match link.start().await {
            Ok(Some(offer)) => self.send(offer),
            Ok(None) => {}
            Err(e) => {
                link.close().await;
                self.report_link_failure(&user_id, e);
                return;
            }
        }

        info!("Opened {} to {} as {:?}", link_id, user_id, role);
        self.links.insert(user_id.clone(), link);
        self.sync_link_state(&user_id);
    }

    /// Closes the link but keeps the peer in the read model; membership is
    /// the server's business.
    async fn fail_link(&mut self, user_id: &UserId, error: LinkError) {
        if let Some(mut link) = self.links.remove(user_id) {
            link.close().await;
        }
        self.report_link_failure(user_id, error);
    }

    fn report_link_failure(&mut self, user_id: &UserId, error: LinkError) {
        error!("Link to {} failed: {}", user_id, error);
        self.peers.set_link_state(user_id, LinkState::Closed);
        self.peers.clear_stream(user_id);
        self.emit(CallEvent::LinkFailed {
            user_id: user_id.clone(),
            error,
        });
    }

    async fn after_link_call(&mut self, user_id: &UserId, result: Result<(), LinkError>) {
        match result {
            Ok(()) => self.sync_link_state(user_id),
            Err(e) => self.handle_link_error(user_id, e).await,
        }
    }

    async fn handle_link_error(&mut self, user_id: &UserId, error: LinkError) {
        if error.is_fatal() {
            self.fail_link(user_id, error).await;
        } else {
            warn!("Ignoring signal from {}: {}", user_id, error);
        }
    }

    fn sync_link_state(&mut self, user_id: &UserId) {
        let Some(state) = self.links.get(user_id).map(PeerLink::state) else {
            return;
        };
        if self.peers.set_link_state(user_id, state) {
            self.emit(CallEvent::LinkStateChanged {
                user_id: user_id.clone(),
                state,
            });
        }
    }

    async fn switch_source(&mut self, source: CaptureSource) -> Result<(), DeviceError> {
        if self.media.source() == source {
            debug!("{:?} is already the active source", source);
            return Ok(());
        }
        self.replace_video_source(source).await
    }

    /// Opens `source` and installs it as the outgoing video of every link.
    /// On failure the current source stays untouched.
    async fn replace_video_source(&mut self, source: CaptureSource) -> Result<(), DeviceError> {
        let previous = self.media.source();
        let track = match self.media.acquire(source).await {
            Ok(track) => track,
            Err(e) => {
                warn!("Could not switch to {:?}: {}", source, e);
                self.emit(CallEvent::DeviceWarning {
                    source,
                    error: e.clone(),
                });
                return Err(e);
            }
        };

        self.substitute_video(&track).await;
        self.media.install(source, track.clone());
        if source == CaptureSource::Screen {
            self.watch_screen(track);
        }

        self.publish_local();
        if previous != source {
            self.send(ClientMessage::ScreenShareState {
                enabled: source == CaptureSource::Screen,
            });
            self.emit(CallEvent::SourceChanged { source });
        }
        Ok(())
    }

    /// Pushes `track` into every open link concurrently. Each link succeeds
    /// or fails on its own.
    async fn substitute_video(&self, track: &MediaTrack) {
        let outcomes = join_all(
            self.links
                .values()
                .filter(|link| link.state().is_open())
                .map(|link| async move {
                    (link.remote().clone(), link.replace_video(track.clone()).await)
                }),
        )
        .await;

        for (user_id, outcome) in outcomes {
            if let Err(error) = outcome {
                warn!("Track substitution for {} failed: {}", user_id, error);
                self.emit(CallEvent::TrackSubstitutionFailed { user_id, error });
            }
        }
    }

    fn watch_screen(&self, track: MediaTrack) {
        let internal = self.internal_tx.clone();
        tokio::spawn(async move {
            if track.ended().await == TrackEnd::External {
                let _ = internal.send(InternalEvent::ScreenEnded {
                    track_id: track.id().to_string(),
                });
            }
        });
    }

    fn arm_negotiation_deadline(&self, link_id: LinkId) {
        let internal = self.internal_tx.clone();
        let timeout = self.config.negotiation_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = internal.send(InternalEvent::NegotiationDeadline(link_id));
        });
    }

    /// Closes all links concurrently, releases devices and tells the server.
    async fn shutdown(&mut self) {
        let links: Vec<PeerLink> = self.links.drain().map(|(_, link)| link).collect();
        info!(
            "Leaving '{}': closing {} links",
            self.room_id,
            links.len()
        );

        join_all(links.into_iter().map(|mut link| async move {
            link.close().await;
        }))
        .await;

        self.media.stop_all();
        self.presence.clear();
        self.peers.clear();
        self.send(ClientMessage::LeaveRoom);
        self.publish_local();
    }

    fn user_for_link(&self, link_id: LinkId) -> Option<UserId> {
        self.links
            .iter()
            .find(|(_, link)| link.id() == link_id)
            .map(|(user_id, _)| user_id.clone())
    }

    fn publish_local(&self) {
        self.local_tx.send_replace(self.media.state());
    }

    fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.signaling.send(msg) {
            error!("Failed to send signaling message: {}", e);
        }
    }

    fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event);
    }
}
