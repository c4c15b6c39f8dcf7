/// Negotiation progress of one peer link. States only move forward, except
/// that any state may drop to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkState {
    Idle,
    Negotiating,
    Connecting,
    Connected,
    Closed,
}

impl LinkState {
    /// Outgoing tracks are attached and can be substituted.
    pub fn is_open(self) -> bool {
        self != LinkState::Closed
    }

    pub fn can_advance_to(self, next: LinkState) -> bool {
        next == LinkState::Closed || (self != LinkState::Closed && next > self)
    }
}
