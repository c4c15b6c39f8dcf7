mod envelope;
mod media;
mod participant;
mod presence;
mod room;
mod signaling;
mod user;

pub use envelope::{SignalEnvelope, SignalKind};
pub use media::{CaptureSource, MediaStateEvent};
pub use participant::Participant;
pub use presence::PresenceEvent;
pub use room::RoomId;
pub use signaling::{ClientMessage, IceServerConfig, ServerMessage};
pub use user::{ConnectionId, UserId};
