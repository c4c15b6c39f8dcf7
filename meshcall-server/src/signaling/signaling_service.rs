use crate::config::ServerConfig;
use crate::error::RoutingError;
use crate::room::{MediaUpdate, OpenRooms, RoomManager, RoomPolicy};
use crate::signaling::{JoinedRoom, Outbound, Session};
use meshcall_core::{
    ClientMessage, IceServerConfig, Participant, RoomId, ServerMessage, UserId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct SignalingInner {
    rooms: RoomManager,
    policy: Arc<dyn RoomPolicy>,
    ice_servers: Vec<IceServerConfig>,
    max_payload_bytes: usize,
}

/// Transport-agnostic signaling router. The WebSocket handler feeds it
/// decoded frames; tests drive it directly.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_policy(config, Arc::new(OpenRooms))
    }

    pub fn with_policy(config: &ServerConfig, policy: Arc<dyn RoomPolicy>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                rooms: RoomManager::new(config.room_channel_capacity),
                policy,
                ice_servers: config.ice_servers.clone(),
                max_payload_bytes: config.max_payload_bytes,
            }),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Registers a new connection and pushes the ICE configuration to it.
    pub fn open_session(&self, outbound: Outbound) -> Session {
        let session = Session::new(outbound);
        session.reply(ServerMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        });
        debug!("Opened signaling session {}", session.connection_id);
        session
    }

    /// Decodes one text frame. A frame that fails to decode is answered with
    /// an error and otherwise ignored; the connection stays usable.
    pub async fn handle_text(&self, session: &mut Session, text: &str) {
        match ClientMessage::decode(text) {
            Ok(msg) => self.handle_message(session, msg).await,
            Err(e) => {
                warn!(
                    "Invalid ClientMessage from connection {}: {}",
                    session.connection_id, e
                );
                session.reply(ServerMessage::error(e.code(), e.to_string()));
            }
        }
    }

    pub async fn handle_message(&self, session: &mut Session, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::JoinRoom {
                room_id,
                user_id,
                display_name,
            } => self.join(session, room_id, user_id, display_name).await,
            ClientMessage::LeaveRoom => {
                self.leave(session).await;
                Ok(())
            }
            ClientMessage::ToggleAudio { enabled } => {
                self.update_media(session, MediaUpdate::Audio(enabled)).await
            }
            ClientMessage::ToggleVideo { enabled } => {
                self.update_media(session, MediaUpdate::Video(enabled)).await
            }
            ClientMessage::ScreenShareState { enabled } => {
                self.update_media(session, MediaUpdate::ScreenShare(enabled))
                    .await
            }
            signal => {
                self.relay(session, signal).await;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Request from connection {} failed: {}", session.connection_id, e);
            session.reply(ServerMessage::error(e.code(), e.to_string()));
        }
    }

    /// Removes the connection from its room, if any. Safe to call twice.
    pub async fn close_session(&self, session: &mut Session) {
        self.leave(session).await;
        debug!("Closed signaling session {}", session.connection_id);
    }

    async fn join(
        &self,
        session: &mut Session,
        room_id: RoomId,
        user_id: UserId,
        display_name: String,
    ) -> Result<(), RoutingError> {
        if user_id.is_empty() {
            return Err(RoutingError::InvalidJoin("user id is empty".to_string()));
        }
        if !self.inner.policy.allows(&room_id).await {
            return Err(RoutingError::RoomRejected(room_id));
        }

        if let Some(current) = session.joined() {
            if current.room_id == room_id && current.user_id == user_id {
                debug!("Connection {} re-sent join for '{}'", session.connection_id, room_id);
            } else {
                self.leave(session).await;
            }
        }

        let participant = Participant {
            user_id: user_id.clone(),
            display_name,
        };
        let roster = self
            .inner
            .rooms
            .join(
                &room_id,
                session.connection_id,
                participant,
                session.outbound().clone(),
            )
            .await?;

        info!(
            "Connection {} joined '{}' as {} with {} existing members",
            session.connection_id,
            room_id,
            user_id,
            roster.len()
        );
        session.set_joined(Some(JoinedRoom { room_id, user_id }));
        Ok(())
    }

    async fn leave(&self, session: &mut Session) {
        let Some(joined) = session.joined().cloned() else {
            return;
        };
        self.inner
            .rooms
            .leave(&joined.room_id, session.connection_id)
            .await;
        session.set_joined(None);
    }

    /// Best-effort forward. Every failure is a logged drop; only a malformed
    /// envelope produces a reply to the sender.
    async fn relay(&self, session: &Session, msg: ClientMessage) {
        let Some(joined) = session.joined() else {
            session.reply(ServerMessage::error(
                RoutingError::NotJoined.code(),
                RoutingError::NotJoined.to_string(),
            ));
            return;
        };

        let Some(envelope) = msg.into_envelope(joined.user_id.clone()) else {
            return;
        };

        if let Err(e) = envelope.validate(self.inner.max_payload_bytes) {
            warn!(
                "Rejected envelope from {} in '{}': {}",
                joined.user_id, joined.room_id, e
            );
            session.reply(ServerMessage::error(e.code(), e.to_string()));
            return;
        }

        if let Err(e) = self
            .inner
            .rooms
            .relay(&joined.room_id, session.connection_id, envelope)
            .await
        {
            warn!("Dropped envelope from {}: {}", joined.user_id, e);
        }
    }

    async fn update_media(
        &self,
        session: &Session,
        update: MediaUpdate,
    ) -> Result<(), RoutingError> {
        let joined = session.joined().ok_or(RoutingError::NotJoined)?;
        self.inner
            .rooms
            .update_media(&joined.room_id, session.connection_id, update)
            .await
    }
}
