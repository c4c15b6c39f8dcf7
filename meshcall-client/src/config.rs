use meshcall_core::IceServerConfig;
use meshcall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::time::Duration;

/// Client-side call settings.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// A link that is not Connected within this window is closed.
    pub negotiation_timeout: Duration,
    /// Upper bound for any single transport or device call.
    pub operation_timeout: Duration,
    /// Used until the server pushes its own `IceConfig`.
    pub ice_servers: Vec<IceServerConfig>,
    pub transport_event_capacity: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Duration::from_secs(15),
            operation_timeout: Duration::from_secs(10),
            ice_servers: vec![
                IceServerConfig::stun(DEFAULT_STUN_ADDR),
                IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
            ],
            transport_event_capacity: 256,
        }
    }
}
