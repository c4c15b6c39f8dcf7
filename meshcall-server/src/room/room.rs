use crate::error::RoutingError;
use crate::room::membership::{Member, Membership};
use crate::room::room_command::RoomCommand;
use crate::room::room_manager::RoomHandle;
use dashmap::DashMap;
use meshcall_core::{
    ConnectionId, Participant, PresenceEvent, RoomId, ServerMessage, SignalEnvelope,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One room's actor. All membership changes and relays for the room go
/// through `run`, so they are linearized without any cross-room lock.
pub struct Room {
    room_id: RoomId,
    generation: u64,
    membership: Membership,
    command_rx: mpsc::Receiver<RoomCommand>,
    registry: Arc<DashMap<RoomId, RoomHandle>>,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        registry: Arc<DashMap<RoomId, RoomHandle>>,
    ) -> Self {
        Self {
            room_id,
            generation,
            membership: Membership::new(),
            command_rx,
            registry,
        }
    }

    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.room_id);

        while let Some(cmd) = self.command_rx.recv().await {
            let departure = matches!(cmd, RoomCommand::Leave { .. });
            self.handle_command(cmd);

            // Only a departure can empty the room; a fresh room may see other
            // commands before its first join.
            if departure && self.membership.is_empty() {
                break;
            }
        }

        self.shutdown().await;
        info!("Room '{}' event loop finished", self.room_id);
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                participant,
                outbound,
                reply,
            } => {
                let member = Member::new(connection_id, participant, outbound);
                let roster = self.handle_join(member);
                let _ = reply.send(Ok(roster));
            }

            RoomCommand::Leave { connection_id } => {
                self.handle_leave(connection_id);
            }

            RoomCommand::Relay {
                connection_id,
                envelope,
            } => {
                if let Err(e) = self.handle_relay(connection_id, envelope) {
                    warn!("Dropped envelope in room '{}': {}", self.room_id, e);
                }
            }

            RoomCommand::MediaState {
                connection_id,
                update,
            } => {
                let Some(member) = self.membership.get_mut(connection_id) else {
                    warn!(
                        "Media state from connection {} which is not in room '{}'",
                        connection_id, self.room_id
                    );
                    return;
                };
                member.media.apply(update);
                let event = member.media_state();
                debug!("Broadcasting media state {:?}", event);
                self.membership
                    .broadcast(connection_id, &ServerMessage::MediaState(event));
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.membership.participants());
            }
        }
    }

    fn handle_join(&mut self, member: Member) -> Vec<Participant> {
        let connection_id = member.connection_id;

        if self.membership.get(connection_id).is_some() {
            debug!("Connection {} already joined '{}'", connection_id, self.room_id);
            let roster: Vec<Participant> = self
                .membership
                .others(connection_id)
                .map(|m| m.participant.clone())
                .collect();
            if let Some(me) = self.membership.get(connection_id) {
                me.send(ServerMessage::RosterSnapshot {
                    room_id: self.room_id.clone(),
                    participants: roster.clone(),
                });
            }
            return roster;
        }

        let joined = member.participant.clone();
        let outcome = self.membership.join(member);

        if let Some(evicted) = outcome.evicted {
            info!(
                "User {} reconnected to '{}'; evicting connection {}",
                evicted.user_id(),
                self.room_id,
                evicted.connection_id
            );
            evicted.send(ServerMessage::error(
                "replaced",
                "a newer connection joined with the same user id",
            ));
            self.membership.broadcast(
                connection_id,
                &PresenceEvent::Left(evicted.user_id().clone()).into(),
            );
        }

        info!(
            "User {} ({}) joined room '{}' ({} members)",
            joined.user_id,
            joined.display_name,
            self.room_id,
            self.membership.len()
        );

        if let Some(me) = self.membership.get(connection_id) {
            me.send(ServerMessage::RosterSnapshot {
                room_id: self.room_id.clone(),
                participants: outcome.roster.clone(),
            });
            for other in self.membership.others(connection_id) {
                me.send(ServerMessage::MediaState(other.media_state()));
            }
        }

        self.membership
            .broadcast(connection_id, &PresenceEvent::Joined(joined).into());

        outcome.roster
    }

    fn handle_leave(&mut self, connection_id: ConnectionId) {
        let Some(member) = self.membership.leave(connection_id) else {
            return;
        };

        info!(
            "User {} left room '{}' ({} members)",
            member.user_id(),
            self.room_id,
            self.membership.len()
        );

        self.membership.broadcast(
            connection_id,
            &PresenceEvent::Left(member.user_id().clone()).into(),
        );
    }

    fn handle_relay(
        &self,
        connection_id: ConnectionId,
        envelope: SignalEnvelope,
    ) -> Result<(), RoutingError> {
        let sender = self
            .membership
            .get(connection_id)
            .ok_or(RoutingError::NotJoined)?;

        if sender.user_id() != &envelope.sender_user_id {
            return Err(RoutingError::NotJoined);
        }

        let target = self
            .membership
            .find_user(&envelope.target_user_id)
            .ok_or_else(|| RoutingError::TargetNotFound {
                room_id: self.room_id.clone(),
                target: envelope.target_user_id.clone(),
            })?;

        debug!(
            "Relaying {:?} from {} to {} in '{}'",
            envelope.kind, envelope.sender_user_id, envelope.target_user_id, self.room_id
        );
        target.send(envelope.into());
        Ok(())
    }

    /// Unregisters the room, then answers whatever was still queued so no
    /// caller waits on a room that will never process its request.
    async fn shutdown(&mut self) {
        let generation = self.generation;
        self.registry
            .remove_if(&self.room_id, |_, handle| handle.generation == generation);
        info!("Room '{}' is empty; removed from directory", self.room_id);

        self.command_rx.close();
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RoomCommand::Join { reply, .. } => {
                    let _ = reply.send(Err(RoutingError::RoomClosed(self.room_id.clone())));
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(Vec::new());
                }
                RoomCommand::Relay { envelope, .. } => {
                    warn!(
                        "Dropped envelope for {} queued behind room '{}' shutdown",
                        envelope.target_user_id, self.room_id
                    );
                }
                RoomCommand::Leave { .. } | RoomCommand::MediaState { .. } => {}
            }
        }
    }
}
