mod link_state;
mod peer_link;
mod read_model;

pub use link_state::*;
pub use peer_link::*;
pub use read_model::*;
