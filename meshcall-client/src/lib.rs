pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod media;
pub mod presence;
pub mod signaling;
pub mod transport;

pub use config::CallConfig;
pub use engine::*;
pub use error::{DeviceError, EngineError, LinkError, SignalingClosed, TransportError};
pub use link::{LinkState, PeerView, PeersSnapshot, RemoteStream};
pub use media::{CaptureDevices, LocalMediaState, MediaTrack, TrackEnd, TrackKind};
pub use presence::Role;
pub use signaling::SignalingSink;
pub use transport::*;
