use crate::error::SignalingClosed;
use meshcall_core::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of the signaling channel. Delivery is fire-and-forget;
/// the only failure is a channel that is already gone.
pub trait SignalingSink: Send + Sync {
    fn send(&self, msg: ClientMessage) -> Result<(), SignalingClosed>;
}

impl SignalingSink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, msg: ClientMessage) -> Result<(), SignalingClosed> {
        mpsc::UnboundedSender::send(self, msg).map_err(|_| SignalingClosed)
    }
}
