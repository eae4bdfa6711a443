//! Player command surface.
//!
//! Chat-style commands are parsed into [`Command`]; key-bound work controls and
//! the location actions at headquarters and the rental desk have their own
//! enums so front ends can bind them however they like.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::session::EquipmentKind;

pub const GET_EQUIPMENT_USAGE: &str =
    "/getequip cam|mic (at the open rear doors of a rented news van)";
pub const STORE_EQUIPMENT_USAGE: &str = "/storeequip [cam|mic]";

/// A chat command issued by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    GetEquipment(EquipmentKind),
    /// Store what is held. A named kind must match it.
    StoreEquipment(Option<EquipmentKind>),
    UploadReport,
    EquipmentHelp,
}

impl Command {
    /// Parses a command line. The leading slash is optional.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| CommandError::UnknownCommand(String::new()))?;
        let name = name.strip_prefix('/').unwrap_or(name).to_ascii_lowercase();
        let arg = parts.next();

        match name.as_str() {
            "getequip" => {
                let kind = arg
                    .ok_or_else(|| CommandError::Usage(GET_EQUIPMENT_USAGE.to_string()))?
                    .parse()?;
                Ok(Self::GetEquipment(kind))
            }
            "storeequip" => {
                let kind = arg
                    .map(|arg| {
                        arg.parse::<EquipmentKind>()
                            .map_err(|_| CommandError::Usage(STORE_EQUIPMENT_USAGE.to_string()))
                    })
                    .transpose()?;
                Ok(Self::StoreEquipment(kind))
            }
            "uploadreport" => Ok(Self::UploadReport),
            "equiphelp" => Ok(Self::EquipmentHelp),
            _ => Err(CommandError::UnknownCommand(name)),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetEquipment(EquipmentKind::Camera) => write!(f, "/getequip cam"),
            Self::GetEquipment(EquipmentKind::Microphone) => write!(f, "/getequip mic"),
            Self::StoreEquipment(_) => write!(f, "/storeequip"),
            Self::UploadReport => write!(f, "/uploadreport"),
            Self::EquipmentHelp => write!(f, "/equiphelp"),
        }
    }
}

/// Key-bound controls for the held equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkControl {
    ToggleShoulder,
    ToggleOnAir,
    ToggleZoom,
    ToggleStatement,
    ToggleInterview,
    ZoomIn,
    ZoomOut,
}

impl WorkControl {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleShoulder => "shoulder",
            Self::ToggleOnAir => "onair",
            Self::ToggleZoom => "zoom",
            Self::ToggleStatement => "statement",
            Self::ToggleInterview => "interview",
            Self::ZoomIn => "zoomin",
            Self::ZoomOut => "zoomout",
        }
    }

    pub fn all() -> [WorkControl; 7] {
        [
            Self::ToggleShoulder,
            Self::ToggleOnAir,
            Self::ToggleZoom,
            Self::ToggleStatement,
            Self::ToggleInterview,
            Self::ZoomIn,
            Self::ZoomOut,
        ]
    }
}

impl FromStr for WorkControl {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|control| control.name() == name)
            .ok_or(CommandError::UnknownCommand(name))
    }
}

/// Actions taken at a location (headquarters, rental desk, return bay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    ClockIn,
    ClockOut,
    RentVehicle,
    ReturnVehicle,
}

impl FromStr for JobAction {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clockin" => Ok(Self::ClockIn),
            "clockout" => Ok(Self::ClockOut),
            "rent" => Ok(Self::RentVehicle),
            "return" => Ok(Self::ReturnVehicle),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}
