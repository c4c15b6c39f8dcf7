use crate::engine::call_event::CallEvent;
use crate::engine::engine_command::EngineCommand;
use crate::error::EngineError;
use crate::link::PeersSnapshot;
use crate::media::LocalMediaState;
use meshcall_core::CaptureSource;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

/// Caller-side handle to a running `CallEngine`.
pub struct CallHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    events: mpsc::UnboundedReceiver<CallEvent>,
    peers: watch::Receiver<PeersSnapshot>,
    local: watch::Receiver<LocalMediaState>,
    task: JoinHandle<()>,
}

impl CallHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<EngineCommand>,
        events: mpsc::UnboundedReceiver<CallEvent>,
        peers: watch::Receiver<PeersSnapshot>,
        local: watch::Receiver<LocalMediaState>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            events,
            peers,
            local,
            task,
        }
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::SetAudio { enabled, reply })
            .await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::SetVideo { enabled, reply })
            .await
    }

    pub async fn share_screen(&self) -> Result<(), EngineError> {
        self.switch_source(CaptureSource::Screen).await
    }

    pub async fn stop_screen_share(&self) -> Result<(), EngineError> {
        self.switch_source(CaptureSource::Camera).await
    }

    /// Fails with `EngineError::Device` if the new source could not be
    /// opened; the previous source is still active in that case.
    pub async fn switch_source(&self, source: CaptureSource) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::SwitchSource { source, reply })
            .await?
            .map_err(EngineError::from)
    }

    /// Remote peers as the engine currently sees them.
    pub fn peers(&self) -> watch::Receiver<PeersSnapshot> {
        self.peers.clone()
    }

    pub fn local_media(&self) -> watch::Receiver<LocalMediaState> {
        self.local.clone()
    }

    pub async fn next_event(&mut self) -> Option<CallEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<CallEvent> {
        self.events.try_recv().ok()
    }

    /// Closes every link and releases local devices. Returns once all of it
    /// has completed.
    pub async fn leave(self) -> Result<(), EngineError> {
        let result = self
            .request(|reply| EngineCommand::Leave { reply })
            .await;
        if let Err(e) = self.task.await {
            warn!("Call engine task ended abnormally: {}", e);
        }
        result
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| EngineError::Stopped)?;
        rx.await.map_err(|_| EngineError::Stopped)
    }
}
