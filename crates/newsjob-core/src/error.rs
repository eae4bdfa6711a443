//! Error types for the news job session.
//!
//! Each operation family has its own enum so callers can match on the exact
//! precondition that failed. [`NewsJobError`] wraps them all for code that
//! only needs to propagate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::Severity;

/// An error that is shown to the player when a command is rejected.
pub trait UserFacing: Send + Sync {
    /// Message handed to the presentation collaborator.
    fn user_message(&self) -> String;

    /// Severity of the message. Rejections are informational by default.
    fn severity(&self) -> Severity {
        Severity::Info
    }
}

/// Failures of the Equipment Registry (acquire / store).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentError {
    #[error("actor is not on duty")]
    NotEmployed,
    #[error("actor is not at the open storage of a work vehicle")]
    NotNearStorage,
    #[error("actor is already holding something")]
    AlreadyHolding,
    #[error("actor is not holding any equipment")]
    NothingHeld,
    #[error("actor is holding different equipment")]
    WrongEquipment,
    #[error("equipment prop could not be created")]
    CreationFailed,
    #[error("equipment access interrupted")]
    Interrupted,
}

impl UserFacing for EquipmentError {
    fn user_message(&self) -> String {
        match self {
            Self::NotEmployed => "You need to be on duty to use news equipment.",
            Self::NotNearStorage => {
                "You need to open the doors and access the storage from the rear."
            }
            Self::AlreadyHolding => "You need to put away what is in your hands first.",
            Self::NothingHeld => "You are not holding any news equipment.",
            Self::WrongEquipment => "That is not the equipment you are holding.",
            Self::CreationFailed => "The equipment could not be taken out, try again.",
            Self::Interrupted => "You lost your grip on the equipment.",
        }
        .to_string()
    }

    fn severity(&self) -> Severity {
        match self {
            Self::CreationFailed => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// Failures of the Work-State Tracker toggles.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkStateError {
    #[error("actor is not on duty")]
    NotEmployed,
    #[error("held equipment does not support this control")]
    WrongEquipment,
    #[error("camera is not on the shoulder")]
    NotShouldered,
    #[error("camera is not on air")]
    NotOnAir,
    #[error("a transition is still in progress")]
    TransitionInProgress,
    #[error("an interruption reset the work state")]
    Interrupted,
}

impl UserFacing for WorkStateError {
    fn user_message(&self) -> String {
        match self {
            Self::NotEmployed => "You need to be on duty to do that.",
            Self::WrongEquipment => "You need the right equipment in your hands for that.",
            Self::NotShouldered => "Put the camera on your shoulder before going live.",
            Self::NotOnAir => "The zoom camera only works while you are live.",
            Self::TransitionInProgress => "Hold on, still getting ready.",
            Self::Interrupted => "You can't record right now.",
        }
        .to_string()
    }
}

/// Failures of the Rental Lifecycle Manager.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalError {
    #[error("actor is not on duty")]
    NotEmployed,
    #[error("actor is not at the rental pickup")]
    NotAtPickup,
    #[error("a vehicle is already rented")]
    AlreadyRented,
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: u32, available: i64 },
    #[error("no rental slot available")]
    NoSlotAvailable,
    #[error("rental vehicle could not be spawned")]
    VehicleSpawnFailed,
    #[error("no vehicle is rented")]
    NoRental,
    #[error("actor is not at the rental return point")]
    NotAtReturnPoint,
    #[error("actor is not driving the rented vehicle")]
    NotDriver,
}

impl UserFacing for RentalError {
    fn user_message(&self) -> String {
        match self {
            Self::NotEmployed => "You need to be on duty to rent a work vehicle.".to_string(),
            Self::NotAtPickup => "Vehicles are rented at the rental desk.".to_string(),
            Self::AlreadyRented => "You already have a work vehicle rented.".to_string(),
            Self::InsufficientFunds { required, .. } => {
                format!("Renting this job vehicle requires a {required} security deposit.")
            }
            Self::NoSlotAvailable => {
                "No parking spots available, come back another time.".to_string()
            }
            Self::VehicleSpawnFailed => {
                "The vehicle could not be brought out, your deposit was returned.".to_string()
            }
            Self::NoRental => "You have not rented a work vehicle.".to_string(),
            Self::NotAtReturnPoint => "Vehicles are returned at the return bay.".to_string(),
            Self::NotDriver => "You need to be driving the vehicle you rented.".to_string(),
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Self::InsufficientFunds { .. } | Self::VehicleSpawnFailed => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// Failures of the Payout Engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadError {
    #[error("actor is not on duty")]
    NotEmployed,
    #[error("actor is not in a work vehicle")]
    WrongVehicle,
    #[error("no recorded work time to upload")]
    NothingToUpload,
    #[error("an upload is already in flight")]
    AlreadyUploading,
    #[error("upload was cancelled before it completed")]
    Cancelled,
}

impl UserFacing for UploadError {
    fn user_message(&self) -> String {
        match self {
            Self::NotEmployed => "You need to be on duty to upload a report.",
            Self::WrongVehicle => "You need to be in a work vehicle to upload back to HQ.",
            Self::NothingToUpload => {
                "Your media storage is empty. Get to work before you bother sending anything back to HQ."
            }
            Self::AlreadyUploading => "Your data is still uploading.",
            Self::Cancelled => "The upload was cut off, your footage is still on the drive.",
        }
        .to_string()
    }
}

/// Failures of the employment toggle at headquarters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentError {
    #[error("actor is not at headquarters")]
    NotAtHeadquarters,
    #[error("actor is already on duty")]
    AlreadyEmployed,
    #[error("actor is not on duty")]
    NotEmployed,
    #[error("job training is still running")]
    InTraining,
}

impl UserFacing for EmploymentError {
    fn user_message(&self) -> String {
        match self {
            Self::NotAtHeadquarters => "Head to the news office to do that.",
            Self::AlreadyEmployed => "You already work here.",
            Self::NotEmployed => "You don't work here.",
            Self::InTraining => "Finish reading the job briefing first.",
        }
        .to_string()
    }
}

/// Failures to parse or accept a player command.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error("equipment help requires equipment in hand")]
    HelpUnavailable,
}

impl UserFacing for CommandError {
    fn user_message(&self) -> String {
        match self {
            Self::UnknownCommand(name) => format!("Unknown command: {name}"),
            Self::Usage(usage) => format!("Usage: {usage}"),
            Self::HelpUnavailable => {
                "You need equipment in your hand before you can read the manual for it."
                    .to_string()
            }
        }
    }
}

/// A shared error type for the whole news job workspace.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum NewsJobError {
    #[error(transparent)]
    Equipment(#[from] EquipmentError),

    #[error(transparent)]
    WorkState(#[from] WorkStateError),

    #[error(transparent)]
    Rental(#[from] RentalError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Employment(#[from] EmploymentError),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NewsJobError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error came from a rejected player action.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Equipment(_)
                | Self::WorkState(_)
                | Self::Rental(_)
                | Self::Upload(_)
                | Self::Employment(_)
                | Self::Command(_)
        )
    }

    /// The player-facing form of a rejection, if this is one.
    pub fn as_user_facing(&self) -> Option<&dyn UserFacing> {
        match self {
            Self::Equipment(e) => Some(e),
            Self::WorkState(e) => Some(e),
            Self::Rental(e) => Some(e),
            Self::Upload(e) => Some(e),
            Self::Employment(e) => Some(e),
            Self::Command(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NewsJobError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NewsJobError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NewsJobError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NewsJobError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, NewsJobError>`.
pub type Result<T> = std::result::Result<T, NewsJobError>;
