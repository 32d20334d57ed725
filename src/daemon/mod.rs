//! The long-running heartbeat loop.

mod heartbeat;

pub use heartbeat::Heartbeat;
