use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::world::{ActorSnapshot, PresentationCue};

use super::model::{EquipmentHeld, JobSession};

/// A condition that disqualifies the actor from holding equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionCause {
    Driving,
    Injured,
    Scenario,
    Restrained,
    Submerged,
    Climbing,
    AirborneWithCamera,
}

impl fmt::Display for InterruptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Driving => "driving",
            Self::Injured => "injured",
            Self::Scenario => "in scenario",
            Self::Restrained => "restrained",
            Self::Submerged => "submerged",
            Self::Climbing => "climbing",
            Self::AirborneWithCamera => "airborne with camera",
        };
        f.write_str(text)
    }
}

/// First disqualifying condition in the snapshot, if any.
pub fn interruption_cause(
    snapshot: &ActorSnapshot,
    baseline_health: i32,
    holding_camera: bool,
) -> Option<InterruptionCause> {
    if snapshot.current_vehicle.is_some() || snapshot.is_driving {
        Some(InterruptionCause::Driving)
    } else if snapshot.health < baseline_health {
        Some(InterruptionCause::Injured)
    } else if snapshot.in_scenario {
        Some(InterruptionCause::Scenario)
    } else if snapshot.restrained {
        Some(InterruptionCause::Restrained)
    } else if snapshot.submerged {
        Some(InterruptionCause::Submerged)
    } else if snapshot.climbing {
        Some(InterruptionCause::Climbing)
    } else if snapshot.airborne && holding_camera {
        Some(InterruptionCause::AirborneWithCamera)
    } else {
        None
    }
}

impl JobSession {
    /// Whether a disqualifying condition holds right now.
    pub fn evaluate(&self) -> bool {
        self.interruption().is_some()
    }

    pub fn interruption(&self) -> Option<InterruptionCause> {
        let snapshot = self.world.snapshot(self.actor);
        self.interruption_for(&snapshot)
    }

    pub(crate) fn interruption_for(&self, snapshot: &ActorSnapshot) -> Option<InterruptionCause> {
        // Without equipment there is no baseline to be injured against.
        let baseline = if self.equipment.is_held() {
            self.starting_health
        } else {
            snapshot.health
        };
        let holding_camera = matches!(self.equipment, EquipmentHeld::Camera(_));
        interruption_cause(snapshot, baseline, holding_camera)
    }

    /// Drops whatever is held and returns every work-state to idle.
    pub(crate) fn force_reset(&mut self, cause: InterruptionCause) {
        if self.equipment.is_held() {
            warn!(
                session_id = %self.id,
                actor = %self.actor,
                %cause,
                "Work interrupted, dropping equipment"
            );
        }
        self.drop_equipment();
    }

    /// Detaches the held prop without deleting it and clears all work-state.
    ///
    /// The dropped prop stays outstanding against the rental deposit.
    pub fn drop_equipment(&mut self) {
        let held = std::mem::take(&mut self.equipment);
        match held {
            EquipmentHeld::None => return,
            EquipmentHeld::Camera(rig) => {
                if rig.broadcast.is_live() {
                    self.end_broadcast_presentation();
                }
                self.world.detach(rig.prop);
            }
            EquipmentHeld::Microphone(rig) => {
                self.world.detach(rig.prop);
            }
        }
        self.cue(PresentationCue::ClearPose);
        self.next_accrual = None;
        debug!(session_id = %self.id, kind = ?held.kind(), "Equipment dropped");
    }

    pub(crate) fn end_broadcast_presentation(&self) {
        self.cue(PresentationCue::NewsOverlay { visible: false });
        self.cue(PresentationCue::ZoomCamera(None));
        self.cue(PresentationCue::ScreenFadeIn);
    }
}
