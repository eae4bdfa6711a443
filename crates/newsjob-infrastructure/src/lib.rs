//! Infrastructure for the news job: config files on disk and an in-memory
//! world that implements every collaborator trait.

pub mod config_service;
pub mod paths;
pub mod simulated_world;

pub use crate::config_service::ConfigService;
pub use crate::paths::{NewsJobPaths, PathError};
pub use crate::simulated_world::{SimulatedWorld, WorldEvent};
