use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    #[default]
    Camera,
    Screen,
}

/// Broadcast whenever a participant flips audio/video or starts/stops sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStateEvent {
    pub user_id: UserId,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
}
