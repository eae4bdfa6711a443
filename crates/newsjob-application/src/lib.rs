//! Application layer for the news job.
//!
//! Wraps the synchronous domain sessions for use from async code: a registry
//! keyed by actor, handles that await real delays without holding a session
//! lock, a ticker for the per-frame evaluator, and the command use case that
//! turns player input into session operations.

pub mod command_usecase;
pub mod session;

pub use command_usecase::{CommandOutcome, CommandUseCase};
pub use session::{SessionHandle, SessionRegistry, SessionTicker};
