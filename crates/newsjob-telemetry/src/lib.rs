//! Logging bootstrap and session event streaming.

mod init;
pub mod session_layer;

pub use init::{LogFormat, init_tracing, init_tracing_with_events};
pub use session_layer::{SessionEventLayer, SessionLogEvent};
