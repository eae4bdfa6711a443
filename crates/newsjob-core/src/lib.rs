//! Domain layer for the news crew job.
//!
//! One [`JobSession`](session::JobSession) exists per actor. It owns the
//! employment state, the held equipment and its work-state machine, the
//! work-time accumulator, the rental vehicle lifecycle and the payout
//! protocol. Everything outside the session (props, vehicles, money, UI) is
//! reached through the collaborator traits in [`world`].
//!
//! The crate is synchronous: callers pass `std::time::Instant` values in and
//! the application layer decides how real delays are awaited.

pub mod command;
pub mod config;
pub mod error;
pub mod geometry;
pub mod session;
pub mod world;

// Re-export common types
pub use config::JobConfig;
pub use error::{NewsJobError, Result};
pub use session::JobSession;
pub use world::{ActorId, JobWorld};
