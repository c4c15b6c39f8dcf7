use meshcall_core::IceServerConfig;
use meshcall_core::utils::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::net::SocketAddr;

/// Runtime settings for the signaling server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Pushed to every client as the first frame after connecting.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of each room's command queue.
    pub room_channel_capacity: usize,
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            room_channel_capacity: 256,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}
