mod call_engine;
mod call_event;
mod call_handle;
mod engine_command;

pub use call_engine::*;
pub use call_event::*;
pub use call_handle::*;
