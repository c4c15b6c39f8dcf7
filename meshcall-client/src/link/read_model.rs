use crate::link::link_state::LinkState;
use crate::transport::RemoteTrack;
use meshcall_core::{MediaStateEvent, UserId};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::watch;

/// Media received from one remote user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteStream {
    pub tracks: Vec<RemoteTrack>,
}

/// What the UI knows about one remote participant.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerView {
    pub display_name: String,
    pub remote_stream: Option<RemoteStream>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
    pub link_state: LinkState,
}

impl PeerView {
    fn new(display_name: String) -> Self {
        Self {
            display_name,
            remote_stream: None,
            audio_enabled: true,
            video_enabled: true,
            screen_sharing: false,
            link_state: LinkState::Idle,
        }
    }

    fn apply(&mut self, event: &MediaStateEvent) {
        self.audio_enabled = event.audio_enabled;
        self.video_enabled = event.video_enabled;
        self.screen_sharing = event.screen_sharing;
    }
}

pub type PeersSnapshot = BTreeMap<UserId, PeerView>;

/// Engine-owned writer for the remote-peer read model.
pub struct PeerDirectory {
    tx: watch::Sender<PeersSnapshot>,
    early_media: HashMap<UserId, MediaStateEvent>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PeersSnapshot::new());
        Self {
            tx,
            early_media: HashMap::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PeersSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PeersSnapshot {
        self.tx.borrow().clone()
    }

    /// Adds a peer, applying any media state that arrived before it.
    pub fn insert(&mut self, user_id: &UserId, display_name: &str) {
        let mut view = PeerView::new(display_name.to_string());
        if let Some(event) = self.early_media.remove(user_id) {
            view.apply(&event);
        }
        self.tx.send_modify(|peers| {
            peers.insert(user_id.clone(), view);
        });
    }

    /// Returns `true` if the stored state changed.
    pub fn set_link_state(&mut self, user_id: &UserId, state: LinkState) -> bool {
        self.tx.send_if_modified(|peers| match peers.get_mut(user_id) {
            Some(view) if view.link_state != state => {
                view.link_state = state;
                true
            }
            _ => false,
        })
    }

    pub fn apply_media(&mut self, event: MediaStateEvent) {
        let applied = self.tx.send_if_modified(|peers| match peers.get_mut(&event.user_id) {
            Some(view) => {
                view.apply(&event);
                true
            }
            None => false,
        });
        if !applied {
            self.early_media.insert(event.user_id.clone(), event);
        }
    }

    pub fn add_remote_track(&mut self, user_id: &UserId, track: RemoteTrack) {
        self.tx.send_if_modified(|peers| {
            let Some(view) = peers.get_mut(user_id) else {
                return false;
            };
            let stream = view.remote_stream.get_or_insert_with(RemoteStream::default);
            stream.tracks.retain(|t| t.kind != track.kind);
            stream.tracks.push(track);
            true
        });
    }

    /// Drops the remote stream; used when a link closes but the peer stays.
    pub fn clear_stream(&mut self, user_id: &UserId) {
        self.tx.send_if_modified(|peers| match peers.get_mut(user_id) {
            Some(view) => view.remote_stream.take().is_some(),
            None => false,
        });
    }

    pub fn remove(&mut self, user_id: &UserId) {
        self.early_media.remove(user_id);
        self.tx.send_if_modified(|peers| peers.remove(user_id).is_some());
    }

    pub fn clear(&mut self) {
        self.early_media.clear();
        self.tx.send_modify(PeersSnapshot::clear);
    }
}

impl Default for PeerDirectory {
    fn default() -> Self {
        Self::new()
    }
}
