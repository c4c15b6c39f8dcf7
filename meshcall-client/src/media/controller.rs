use crate::error::DeviceError;
use crate::media::devices::CaptureDevices;
use crate::media::track::MediaTrack;
use meshcall_core::CaptureSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Snapshot of the local side, published to readers of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMediaState {
    pub source: CaptureSource,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub audio_track_id: String,
    pub video_track_id: String,
}

/// Owns the microphone and the single active video source.
///
/// Swapping sources is split in two steps so the engine can push the new
/// track into every link between `acquire` and `install`.
pub struct MediaController {
    devices: Arc<dyn CaptureDevices>,
    operation_timeout: Duration,
    source: CaptureSource,
    audio: MediaTrack,
    video: MediaTrack,
}

impl MediaController {
    /// Opens the microphone and the camera.
    pub async fn open(
        devices: Arc<dyn CaptureDevices>,
        operation_timeout: Duration,
    ) -> Result<Self, DeviceError> {
        let audio = with_timeout(operation_timeout, devices.open_microphone()).await?;
        let video = match with_timeout(operation_timeout, devices.open_camera()).await {
            Ok(track) => track,
            Err(e) => {
                audio.stop();
                return Err(e);
            }
        };

        info!("Opened microphone {} and camera {}", audio.id(), video.id());
        Ok(Self {
            devices,
            operation_timeout,
            source: CaptureSource::Camera,
            audio,
            video,
        })
    }

    pub fn source(&self) -> CaptureSource {
        self.source
    }

    pub fn audio_track(&self) -> &MediaTrack {
        &self.audio
    }

    pub fn video_track(&self) -> &MediaTrack {
        &self.video
    }

    /// Tracks handed to every new link.
    pub fn tracks(&self) -> Vec<MediaTrack> {
        vec![self.audio.clone(), self.video.clone()]
    }

    /// Returns `true` if the flag actually changed.
    pub fn set_audio_enabled(&mut self, enabled: bool) -> bool {
        if self.audio.is_enabled() == enabled {
            return false;
        }
        self.audio.set_enabled(enabled);
        true
    }

    pub fn set_video_enabled(&mut self, enabled: bool) -> bool {
        if self.video.is_enabled() == enabled {
            return false;
        }
        self.video.set_enabled(enabled);
        true
    }

    /// Opens `source` without making it active. The new track inherits the
    /// current video enabled flag.
    pub async fn acquire(&self, source: CaptureSource) -> Result<MediaTrack, DeviceError> {
        let open = async {
            match source {
                CaptureSource::Camera => self.devices.open_camera().await,
                CaptureSource::Screen => self.devices.open_screen().await,
            }
        };
        let track = with_timeout(self.operation_timeout, open).await?;
        track.set_enabled(self.video.is_enabled());
        Ok(track)
    }

    /// Makes `track` the active video source and stops the previous one.
    pub fn install(&mut self, source: CaptureSource, track: MediaTrack) {
        let previous = std::mem::replace(&mut self.video, track);
        previous.stop();
        info!(
            "Video source is now {:?} ({}), released {}",
            source,
            self.video.id(),
            previous.id()
        );
        self.source = source;
    }

    pub fn state(&self) -> LocalMediaState {
        LocalMediaState {
            source: self.source,
            audio_enabled: self.audio.is_enabled(),
            video_enabled: self.video.is_enabled(),
            audio_track_id: self.audio.id().to_string(),
            video_track_id: self.video.id().to_string(),
        }
    }

    /// Settles on the camera with video off after the screen ended and the
    /// camera could not be reopened. The ended track stays installed until
    /// video is enabled again.
    pub fn fall_back_without_video(&mut self) {
        self.video.set_enabled(false);
        self.video.stop();
        self.source = CaptureSource::Camera;
        info!("No camera available; video is off");
    }

    pub fn stop_all(&self) {
        self.audio.stop();
        self.video.stop();
    }
}

async fn with_timeout<F>(timeout: Duration, open: F) -> Result<MediaTrack, DeviceError>
where
    F: Future<Output = Result<MediaTrack, DeviceError>>,
{
    match tokio::time::timeout(timeout, open).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Capture device did not answer within {:?}", timeout);
            Err(DeviceError::Timeout)
        }
    }
}
