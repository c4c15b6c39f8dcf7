mod routes;
mod session;
mod signaling_service;
mod ws_handler;

pub use routes::*;
pub use session::*;
pub use signaling_service::*;
pub use ws_handler::*;

use meshcall_core::ServerMessage;
use tokio::sync::mpsc;

/// Per-connection outbound queue, drained by that connection's writer task.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;
