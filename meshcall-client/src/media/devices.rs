use crate::error::DeviceError;
use crate::media::track::MediaTrack;
use async_trait::async_trait;

/// Local capture hardware. Each call opens a fresh track; the caller owns
/// it and stops it when done. Implementations keep writing samples until the
/// track ends and honor `MediaTrack::is_enabled` as the mute switch.
#[async_trait]
pub trait CaptureDevices: Send + Sync {
    async fn open_microphone(&self) -> Result<MediaTrack, DeviceError>;

    async fn open_camera(&self) -> Result<MediaTrack, DeviceError>;

    /// Screen tracks report an external stop through `MediaTrack::ended`.
    async fn open_screen(&self) -> Result<MediaTrack, DeviceError>;
}
