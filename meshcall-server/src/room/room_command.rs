use crate::error::RoutingError;
use crate::room::membership::MediaUpdate;
use crate::signaling::Outbound;
use meshcall_core::{ConnectionId, Participant, SignalEnvelope};
use tokio::sync::oneshot;

/// Commands a room actor processes one at a time.
#[derive(Debug)]
pub enum RoomCommand {
    /// Register a connection. The room itself pushes the roster snapshot into
    /// `outbound` so it is ordered before any later presence or relay frame.
    Join {
        connection_id: ConnectionId,
        participant: Participant,
        outbound: Outbound,
        reply: oneshot::Sender<Result<Vec<Participant>, RoutingError>>,
    },

    /// Explicit leave or transport disconnect.
    Leave { connection_id: ConnectionId },

    /// Forward an envelope to its target inside this room.
    Relay {
        connection_id: ConnectionId,
        envelope: SignalEnvelope,
    },

    /// Update the sender's media flags and broadcast the result.
    MediaState {
        connection_id: ConnectionId,
        update: MediaUpdate,
    },

    /// Read-only roster for inspection.
    Snapshot {
        reply: oneshot::Sender<Vec<Participant>>,
    },
}
