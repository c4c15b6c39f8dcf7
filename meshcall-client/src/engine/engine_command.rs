use crate::error::DeviceError;
use crate::transport::LinkId;
use meshcall_core::CaptureSource;
use tokio::sync::oneshot;

/// Requests from a `CallHandle`.
pub(crate) enum EngineCommand {
    SetAudio {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    SetVideo {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    SwitchSource {
        source: CaptureSource,
        reply: oneshot::Sender<Result<(), DeviceError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
}

/// Events the engine schedules for itself.
#[derive(Debug)]
pub(crate) enum InternalEvent {
    NegotiationDeadline(LinkId),
    ScreenEnded { track_id: String },
}
