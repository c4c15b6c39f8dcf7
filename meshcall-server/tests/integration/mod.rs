pub mod messaging_tests;

use meshcall_server::{RoomPolicy, ServerConfig, SignalingService};
use std::sync::Arc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_service() -> SignalingService {
    SignalingService::new(&ServerConfig::default())
}

pub fn create_test_service_with_policy(policy: impl RoomPolicy) -> SignalingService {
    SignalingService::with_policy(&ServerConfig::default(), Arc::new(policy))
}
