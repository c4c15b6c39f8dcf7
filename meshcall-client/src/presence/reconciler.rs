use meshcall_core::{Participant, UserId};
use std::collections::BTreeMap;
use tracing::debug;

/// Which side of a pair sends the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    /// The smaller identifier initiates. Both sides compute the same answer
    /// from the pair alone, so there is never an offer collision.
    pub fn for_pair(local: &UserId, remote: &UserId) -> Role {
        if local < remote {
            Role::Initiator
        } else {
            Role::Responder
        }
    }
}

/// What the link layer should do after a presence change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceAction {
    Open {
        user_id: UserId,
        display_name: String,
        role: Role,
    },
    Close {
        user_id: UserId,
    },
}

/// Tracks who is in the room and turns roster/presence events into link
/// actions. Repeated events for the same user are ignored.
pub struct PresenceReconciler {
    local: UserId,
    known: BTreeMap<UserId, String>,
}

impl PresenceReconciler {
    pub fn new(local: UserId) -> Self {
        Self {
            local,
            known: BTreeMap::new(),
        }
    }

    pub fn roster(&mut self, participants: &[Participant]) -> Vec<PresenceAction> {
        participants
            .iter()
            .filter_map(|p| self.joined(&p.user_id, &p.display_name))
            .collect()
    }

    pub fn joined(&mut self, user_id: &UserId, display_name: &str) -> Option<PresenceAction> {
        if user_id == &self.local {
            debug!("Ignoring presence about the local user");
            return None;
        }
        if self.known.contains_key(user_id) {
            debug!("User {} is already known; ignoring join", user_id);
            return None;
        }

        self.known.insert(user_id.clone(), display_name.to_string());
        Some(PresenceAction::Open {
            user_id: user_id.clone(),
            display_name: display_name.to_string(),
            role: Role::for_pair(&self.local, user_id),
        })
    }

    pub fn left(&mut self, user_id: &UserId) -> Option<PresenceAction> {
        self.known.remove(user_id).map(|_| PresenceAction::Close {
            user_id: user_id.clone(),
        })
    }

    /// An offer arrived from someone we have not seen in presence yet. Only
    /// a peer that outranks us may open the conversation this way.
    pub fn offer_from_unknown(&mut self, user_id: &UserId) -> Option<PresenceAction> {
        if Role::for_pair(&self.local, user_id) != Role::Responder || user_id == &self.local {
            return None;
        }
        self.joined(user_id, user_id.as_str())
    }

    pub fn display_name(&self, user_id: &UserId) -> Option<&str> {
        self.known.get(user_id).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.known.clear();
    }
}
