use crate::signaling::Outbound;
use meshcall_core::{ConnectionId, MediaStateEvent, Participant, ServerMessage, UserId};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaUpdate {
    Audio(bool),
    Video(bool),
    ScreenShare(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFlags {
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
}

impl Default for MediaFlags {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            video_enabled: true,
            screen_sharing: false,
        }
    }
}

impl MediaFlags {
    pub fn apply(&mut self, update: MediaUpdate) {
        match update {
            MediaUpdate::Audio(enabled) => self.audio_enabled = enabled,
            MediaUpdate::Video(enabled) => self.video_enabled = enabled,
            MediaUpdate::ScreenShare(enabled) => self.screen_sharing = enabled,
        }
    }
}

/// One joined connection and the queue its socket writer drains.
#[derive(Debug)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub participant: Participant,
    pub media: MediaFlags,
    outbound: Outbound,
}

impl Member {
    pub fn new(connection_id: ConnectionId, participant: Participant, outbound: Outbound) -> Self {
        Self {
            connection_id,
            participant,
            media: MediaFlags::default(),
            outbound,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.participant.user_id
    }

    /// Never blocks; a closed queue only means the socket is already gone.
    pub fn send(&self, msg: ServerMessage) -> bool {
        match self.outbound.send(msg) {
            Ok(()) => true,
            Err(_) => {
                error!(
                    "Failed to queue message for connection {} ({})",
                    self.connection_id,
                    self.user_id()
                );
                false
            }
        }
    }

    pub fn media_state(&self) -> MediaStateEvent {
        MediaStateEvent {
            user_id: self.user_id().clone(),
            audio_enabled: self.media.audio_enabled,
            video_enabled: self.media.video_enabled,
            screen_sharing: self.media.screen_sharing,
        }
    }
}

#[derive(Debug)]
pub struct JoinOutcome {
    /// Everyone already in the room, in join order, excluding the joiner.
    pub roster: Vec<Participant>,
    /// An older connection holding the same user id, removed by this join.
    pub evicted: Option<Member>,
}

/// The set of joined connections of one room, in join order.
#[derive(Debug, Default)]
pub struct Membership {
    members: Vec<Member>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds `member`. The newest connection for a user id wins.
    pub fn join(&mut self, member: Member) -> JoinOutcome {
        let evicted = self
            .members
            .iter()
            .position(|m| m.user_id() == member.user_id())
            .map(|pos| self.members.remove(pos));

        let roster = self.participants();
        self.members.push(member);

        JoinOutcome { roster, evicted }
    }

    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<Member> {
        let pos = self
            .members
            .iter()
            .position(|m| m.connection_id == connection_id)?;
        Some(self.members.remove(pos))
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.connection_id == connection_id)
    }

    pub fn get_mut(&mut self, connection_id: ConnectionId) -> Option<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.connection_id == connection_id)
    }

    pub fn find_user(&self, user_id: &UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id() == user_id)
    }

    pub fn others(&self, connection_id: ConnectionId) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(move |m| m.connection_id != connection_id)
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.members.iter().map(|m| m.participant.clone()).collect()
    }

    /// Sends `msg` to every member except `except`. Returns how many queues
    /// accepted it; a dead queue does not stop delivery to the rest.
    pub fn broadcast(&self, except: ConnectionId, msg: &ServerMessage) -> usize {
        self.others(except)
            .filter(|m| m.send(msg.clone()))
            .count()
    }
}
