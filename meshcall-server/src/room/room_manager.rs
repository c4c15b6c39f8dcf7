use crate::error::RoutingError;
use crate::room::membership::MediaUpdate;
use crate::room::{Room, RoomCommand};
use crate::signaling::Outbound;
use dashmap::DashMap;
use meshcall_core::{ConnectionId, Participant, RoomId, SignalEnvelope};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// A join can race with the room's own shutdown at most this many times
/// before the caller gives up.
const JOIN_ATTEMPTS: usize = 3;

/// Directory entry for a live room actor.
#[derive(Clone)]
pub struct RoomHandle {
    pub(crate) tx: mpsc::Sender<RoomCommand>,
    pub(crate) generation: u64,
}

/// The membership directory: maps room ids to room actors, creating a room
/// on first join. Rooms remove themselves once empty.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    next_generation: Arc<AtomicU64>,
    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_generation: Arc::new(AtomicU64::new(0)),
            channel_capacity: channel_capacity.max(1),
        }
    }

    fn get_or_create_room(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(handle) = self.rooms.get(room_id) {
            return handle.tx.clone();
        }

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                let (tx, rx) = mpsc::channel(self.channel_capacity);
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let room = Room::new(room_id.clone(), generation, rx, self.rooms.clone());
                tokio::spawn(room.run());
                RoomHandle { tx, generation }
            })
            .tx
            .clone()
    }

    fn room_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|handle| handle.tx.clone())
    }

    /// Registers `participant` in `room_id` and returns the roster as of the
    /// moment of joining. The roster frame itself is pushed to `outbound` by
    /// the room, ahead of any later presence or relay frame.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        participant: Participant,
        outbound: Outbound,
    ) -> Result<Vec<Participant>, RoutingError> {
        for _ in 0..JOIN_ATTEMPTS {
            let tx = self.get_or_create_room(room_id);
            let (reply_tx, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                connection_id,
                participant: participant.clone(),
                outbound: outbound.clone(),
                reply: reply_tx,
            };

            if tx.send(cmd).await.is_err() {
                self.forget_closed(room_id, &tx);
                continue;
            }

            match reply_rx.await {
                Ok(Err(RoutingError::RoomClosed(_))) | Err(_) => {
                    self.forget_closed(room_id, &tx);
                    continue;
                }
                Ok(result) => return result,
            }
        }

        warn!("Giving up joining '{}' after {} attempts", room_id, JOIN_ATTEMPTS);
        Err(RoutingError::RoomClosed(room_id.clone()))
    }

    pub async fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) {
        let Some(tx) = self.room_sender(room_id) else {
            return;
        };
        let _ = tx.send(RoomCommand::Leave { connection_id }).await;
    }

    pub async fn relay(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        envelope: SignalEnvelope,
    ) -> Result<(), RoutingError> {
        let tx = self
            .room_sender(room_id)
            .ok_or_else(|| RoutingError::RoomNotFound(room_id.clone()))?;
        tx.send(RoomCommand::Relay {
            connection_id,
            envelope,
        })
        .await
        .map_err(|_| RoutingError::RoomClosed(room_id.clone()))
    }

    pub async fn update_media(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        update: MediaUpdate,
    ) -> Result<(), RoutingError> {
        let tx = self
            .room_sender(room_id)
            .ok_or_else(|| RoutingError::RoomNotFound(room_id.clone()))?;
        tx.send(RoomCommand::MediaState {
            connection_id,
            update,
        })
        .await
        .map_err(|_| RoutingError::RoomClosed(room_id.clone()))
    }

    /// Current participants of a live room, `None` if the room does not exist.
    pub async fn participants(&self, room_id: &RoomId) -> Option<Vec<Participant>> {
        let tx = self.room_sender(room_id)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(RoomCommand::Snapshot { reply: reply_tx }).await.ok()?;
        let participants = reply_rx.await.ok()?;
        (!participants.is_empty()).then_some(participants)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget_closed(&self, room_id: &RoomId, tx: &mpsc::Sender<RoomCommand>) {
        self.rooms
            .remove_if(room_id, |_, handle| handle.tx.same_channel(tx));
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(256)
    }
}
