use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const LOCAL_STREAM_ID: &str = "meshcall-local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Why a track stopped producing media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Stopped by this process, e.g. after a source swap or on leave.
    Stopped,
    /// Ended by something outside the call, like the OS "stop sharing" control.
    External,
}

struct TrackInner {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    end: watch::Sender<Option<TrackEnd>>,
    rtc: Arc<TrackLocalStaticSample>,
}

/// Handle to one local capture track. Clones share state, so a capture
/// device can keep writing samples while the engine holds the same track.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: &str) -> Self {
        let id = format!("{}-{}", label, Uuid::new_v4());
        let rtc = Arc::new(TrackLocalStaticSample::new(
            codec_for(kind),
            id.clone(),
            LOCAL_STREAM_ID.to_string(),
        ));
        let (end, _) = watch::channel(None);

        Self {
            inner: Arc::new(TrackInner {
                id,
                kind,
                enabled: AtomicBool::new(true),
                end,
                rtc,
            }),
        }
    }

    pub fn audio(label: &str) -> Self {
        Self::new(TrackKind::Audio, label)
    }

    pub fn video(label: &str) -> Self {
        Self::new(TrackKind::Video, label)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Mutes or unmutes without touching any peer session.
    ///
    /// This only flips a flag shared by every clone. The capture source
    /// writing into `sample_track` must check `is_enabled` and send silence
    /// (audio) or black frames (video) while it is `false`; nothing else
    /// stops media from flowing.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Releases the device. Idempotent.
    pub fn stop(&self) {
        if self.finish(TrackEnd::Stopped) {
            debug!("Stopped local track {}", self.inner.id);
        }
    }

    /// Signals that the capture source went away on its own.
    pub fn end(&self) {
        if self.finish(TrackEnd::External) {
            debug!("Local track {} ended externally", self.inner.id);
        }
    }

    pub fn end_reason(&self) -> Option<TrackEnd> {
        *self.inner.end.borrow()
    }

    pub fn is_live(&self) -> bool {
        self.end_reason().is_none()
    }

    /// Resolves once the track is stopped or ended.
    pub async fn ended(&self) -> TrackEnd {
        let mut rx = self.inner.end.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(TrackEnd::Stopped),
            Err(_) => TrackEnd::Stopped,
        }
    }

    /// The sample track a capture device writes into.
    pub fn sample_track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.inner.rtc
    }

    pub fn rtc_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.inner.rtc.clone()
    }

    fn finish(&self, reason: TrackEnd) -> bool {
        self.inner.end.send_if_modified(|end| {
            if end.is_some() {
                return false;
            }
            *end = Some(reason);
            true
        })
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .field("end", &self.end_reason())
            .finish()
    }
}

impl PartialEq for MediaTrack {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}
