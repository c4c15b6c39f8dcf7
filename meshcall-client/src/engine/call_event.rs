use crate::error::{DeviceError, LinkError};
use crate::link::LinkState;
use meshcall_core::{CaptureSource, Participant, RoomId, UserId};

/// Notifications for the UI layer. The authoritative per-peer state lives in
/// the `PeersSnapshot` watch channel; these mark the moments it changed.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    Joined {
        room_id: RoomId,
        participants: Vec<Participant>,
    },
    PeerJoined {
        user_id: UserId,
        display_name: String,
    },
    PeerLeft {
        user_id: UserId,
    },
    LinkStateChanged {
        user_id: UserId,
        state: LinkState,
    },
    LinkFailed {
        user_id: UserId,
        error: LinkError,
    },
    TrackSubstitutionFailed {
        user_id: UserId,
        error: LinkError,
    },
    SourceChanged {
        source: CaptureSource,
    },
    DeviceWarning {
        source: CaptureSource,
        error: DeviceError,
    },
    ServerError {
        code: String,
        message: String,
    },
    /// The signaling channel closed underneath the call.
    Disconnected,
}
