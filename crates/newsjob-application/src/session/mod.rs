//! Session application services.
//!
//! This module owns the per-actor sessions, the handles through which tasks
//! drive them, and the ticker that runs their evaluators.

mod handle;
mod registry;
mod ticker;

pub use handle::SessionHandle;
pub use registry::SessionRegistry;
pub use ticker::SessionTicker;
