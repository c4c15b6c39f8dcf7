pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Upper bound for an SDP or ICE payload carried in one envelope.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;
