//! Equipment kinds and the attachment poses used for each work state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::command::GET_EQUIPMENT_USAGE;
use crate::error::CommandError;
use crate::geometry::Vec3;
use crate::world::HelpTopic;

/// The fixed equipment vocabulary of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    Camera,
    Microphone,
}

impl EquipmentKind {
    pub fn help_topic(&self) -> HelpTopic {
        match self {
            Self::Camera => HelpTopic::Camera,
            Self::Microphone => HelpTopic::Microphone,
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Microphone => write!(f, "microphone"),
        }
    }
}

impl FromStr for EquipmentKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cam" | "camera" => Ok(Self::Camera),
            "mic" | "microphone" => Ok(Self::Microphone),
            _ => Err(CommandError::Usage(GET_EQUIPMENT_USAGE.to_string())),
        }
    }
}

/// Skeleton bone a prop is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bone {
    RightHand,
    RightClavicle,
}

/// Bone, offset and rotation (degrees) of an attached prop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachPose {
    pub bone: Bone,
    pub offset: Vec3,
    pub rotation: Vec3,
}

impl AttachPose {
    pub const CAMERA_IN_HAND: AttachPose = AttachPose {
        bone: Bone::RightHand,
        offset: Vec3::new(0.25, 0.025, 0.0),
        rotation: Vec3::new(0.0, -90.0, 45.0),
    };

    pub const CAMERA_SHOULDER: AttachPose = AttachPose {
        bone: Bone::RightClavicle,
        offset: Vec3::new(0.04, 0.05, 0.13),
        rotation: Vec3::new(-45.0, 25.0, 120.0),
    };

    pub const CAMERA_SHOULDER_CROUCHED: AttachPose = AttachPose {
        bone: Bone::RightClavicle,
        offset: Vec3::new(0.02, -0.015, 0.165),
        rotation: Vec3::new(-60.0, 50.0, 150.0),
    };

    pub const MIC_IN_HAND: AttachPose = AttachPose {
        bone: Bone::RightHand,
        offset: Vec3::new(0.1, 0.05, 0.0),
        rotation: Vec3::new(-45.0, 0.0, 0.0),
    };

    pub const MIC_STATEMENT: AttachPose = AttachPose {
        bone: Bone::RightHand,
        offset: Vec3::new(0.11, 0.05, -0.02),
        rotation: Vec3::new(-90.0, 0.0, -15.0),
    };

    /// Pose right after the prop is taken out of storage.
    pub fn in_hand(kind: EquipmentKind) -> Self {
        match kind {
            EquipmentKind::Camera => Self::CAMERA_IN_HAND,
            EquipmentKind::Microphone => Self::MIC_IN_HAND,
        }
    }

    pub fn camera_shoulder(crouched: bool) -> Self {
        if crouched {
            Self::CAMERA_SHOULDER_CROUCHED
        } else {
            Self::CAMERA_SHOULDER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equipment_kind() {
        assert_eq!("cam".parse::<EquipmentKind>().unwrap(), EquipmentKind::Camera);
        assert_eq!("MIC".parse::<EquipmentKind>().unwrap(), EquipmentKind::Microphone);
        assert_eq!(
            "tripod".parse::<EquipmentKind>().unwrap_err(),
            CommandError::Usage(GET_EQUIPMENT_USAGE.to_string())
        );
    }

    #[test]
    fn test_shoulder_pose_follows_stance() {
        assert_eq!(AttachPose::camera_shoulder(false).bone, Bone::RightClavicle);
        assert_eq!(
            AttachPose::camera_shoulder(true).offset,
            Vec3::new(0.02, -0.015, 0.165)
        );
        assert_eq!(AttachPose::in_hand(EquipmentKind::Camera).bone, Bone::RightHand);
    }
}
