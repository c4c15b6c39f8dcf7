pub mod config;
pub mod error;
pub mod room;
pub mod server;
pub mod signaling;

pub use config::ServerConfig;
pub use error::RoutingError;
pub use room::*;
pub use server::serve;
pub use signaling::*;
