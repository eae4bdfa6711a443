use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JobConfig;
use crate::error::UserFacing;
use crate::world::{
    ActorId, HelpTopic, JobWorld, Notification, PresentationCue, PropHandle, VehicleHandle,
};

use super::lens::ZoomLens;
use super::pose::{AttachPose, EquipmentKind};
use super::rental::{EquipmentLedger, RentalState};
use super::schedule::Cadence;

/// Whether the actor currently works for the news company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmploymentState {
    #[default]
    Unemployed,
    Employed,
}

/// Camera work-state. Timed variants carry the instant the transition settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BroadcastState {
    Idle,
    Shouldering { ready_at: Instant },
    Shouldered,
    Starting { ready_at: Instant },
    /// Live. `lens` is `Some` while the zoom camera is active.
    OnAir { lens: Option<ZoomLens> },
    Stopping { ready_at: Instant },
}

impl BroadcastState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Shouldering { .. } => "shouldering",
            Self::Shouldered => "shouldered",
            Self::Starting { .. } => "starting",
            Self::OnAir { .. } => "on-air",
            Self::Stopping { .. } => "stopping",
        }
    }

    /// The camera sits on the shoulder in every state except `Idle`.
    pub fn is_shouldered(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn is_on_air(&self) -> bool {
        matches!(self, Self::OnAir { .. })
    }

    /// The broadcast overlay or fade may be showing.
    pub(crate) fn is_live(&self) -> bool {
        matches!(
            self,
            Self::Starting { .. } | Self::OnAir { .. } | Self::Stopping { .. }
        )
    }
}

/// Microphone work-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeechState {
    #[default]
    Idle,
    Statement,
    Interview,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub prop: PropHandle,
    pub broadcast: BroadcastState,
    /// Stance the shoulder pose was last attached for.
    pub crouched: bool,
}

impl CameraRig {
    pub fn pose(&self) -> AttachPose {
        if self.broadcast.is_shouldered() {
            AttachPose::camera_shoulder(self.crouched)
        } else {
            AttachPose::CAMERA_IN_HAND
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicRig {
    pub prop: PropHandle,
    pub speech: SpeechState,
}

impl MicRig {
    pub fn pose(&self) -> AttachPose {
        match self.speech {
            SpeechState::Statement => AttachPose::MIC_STATEMENT,
            SpeechState::Idle | SpeechState::Interview => AttachPose::MIC_IN_HAND,
        }
    }
}

/// What the actor holds. Each variant carries only the state valid for it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EquipmentHeld {
    #[default]
    None,
    Camera(CameraRig),
    Microphone(MicRig),
}

impl EquipmentHeld {
    pub fn kind(&self) -> Option<EquipmentKind> {
        match self {
            Self::None => None,
            Self::Camera(_) => Some(EquipmentKind::Camera),
            Self::Microphone(_) => Some(EquipmentKind::Microphone),
        }
    }

    pub fn is_held(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn prop(&self) -> Option<PropHandle> {
        match self {
            Self::None => None,
            Self::Camera(rig) => Some(rig.prop),
            Self::Microphone(rig) => Some(rig.prop),
        }
    }

    pub(crate) fn with_prop(self, prop: PropHandle) -> Self {
        match self {
            Self::None => Self::None,
            Self::Camera(rig) => Self::Camera(CameraRig { prop, ..rig }),
            Self::Microphone(rig) => Self::Microphone(MicRig { prop, ..rig }),
        }
    }

    pub fn pose(&self) -> Option<AttachPose> {
        match self {
            Self::None => None,
            Self::Camera(rig) => Some(rig.pose()),
            Self::Microphone(rig) => Some(rig.pose()),
        }
    }

    /// Recognized work: shouldered filming, on air, statement or interview.
    pub fn is_working(&self) -> bool {
        match self {
            Self::None => false,
            Self::Camera(rig) => !matches!(
                rig.broadcast,
                BroadcastState::Idle | BroadcastState::Shouldering { .. }
            ),
            Self::Microphone(rig) => rig.speech != SpeechState::Idle,
        }
    }
}

/// Recorded work time waiting to be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkTime {
    pub minutes: u32,
    pub seconds: u32,
}

impl WorkTime {
    pub fn is_empty(&self) -> bool {
        self.minutes == 0
    }
}

/// Serialisable summary of a session, for status output and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub actor: ActorId,
    pub employment: EmploymentState,
    pub equipment: Option<EquipmentKind>,
    pub broadcast: Option<String>,
    pub speech: Option<SpeechState>,
    pub zoom_active: bool,
    pub work_time: WorkTime,
    pub training: Option<HelpTopic>,
    pub rental: RentalState,
    pub outstanding_equipment: u32,
    pub upload_in_flight: bool,
}

/// The per-actor job session.
///
/// All operations are synchronous and take the current instant from the
/// caller. Operations that involve a delay are split into a `begin_*` step
/// that sets the in-flight marker and returns a ticket, and a `complete_*`
/// step the caller invokes once the ticket is due.
pub struct JobSession {
    pub(crate) id: Uuid,
    pub(crate) actor: ActorId,
    pub(crate) config: Arc<JobConfig>,
    pub(crate) world: Arc<dyn JobWorld>,
    pub(crate) rng: StdRng,

    pub(crate) employment: EmploymentState,
    pub(crate) equipment: EquipmentHeld,
    pub(crate) work_time: WorkTime,
    pub(crate) starting_health: i32,
    pub(crate) observers_present: bool,

    pub(crate) training: Option<HelpTopic>,
    pub(crate) training_ticks: u32,
    /// Equipment kinds whose help text was already shown this shift.
    pub(crate) help_shown: HashSet<EquipmentKind>,

    pub(crate) rental: RentalState,
    pub(crate) ledger: EquipmentLedger,
    pub(crate) last_work_vehicle: Option<VehicleHandle>,

    pub(crate) upload_in_flight: bool,
    pub(crate) storage_access_in_flight: bool,

    pub(crate) next_accrual: Option<Instant>,
    pub(crate) storage_full_until: Option<Instant>,
    pub(crate) accrual: Cadence,
    pub(crate) integrity: Cadence,
}

impl JobSession {
    pub fn new(actor: ActorId, config: Arc<JobConfig>, world: Arc<dyn JobWorld>) -> Self {
        let accrual = Cadence::new(config.timing.accrual_interval());
        let integrity = Cadence::new(config.timing.integrity_interval());
        Self {
            id: Uuid::new_v4(),
            actor,
            config,
            world,
            rng: StdRng::from_entropy(),
            employment: EmploymentState::Unemployed,
            equipment: EquipmentHeld::None,
            work_time: WorkTime::default(),
            starting_health: 0,
            observers_present: false,
            training: None,
            training_ticks: 0,
            help_shown: HashSet::new(),
            rental: RentalState::NoVehicle,
            ledger: EquipmentLedger::default(),
            last_work_vehicle: None,
            upload_in_flight: false,
            storage_access_in_flight: false,
            next_accrual: None,
            storage_full_until: None,
            accrual,
            integrity,
        }
    }

    /// Replaces the payout random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn employment(&self) -> EmploymentState {
        self.employment
    }

    pub fn is_employed(&self) -> bool {
        self.employment == EmploymentState::Employed
    }

    pub fn equipment(&self) -> &EquipmentHeld {
        &self.equipment
    }

    pub fn held_kind(&self) -> Option<EquipmentKind> {
        self.equipment.kind()
    }

    pub fn broadcast_state(&self) -> Option<BroadcastState> {
        match self.equipment {
            EquipmentHeld::Camera(rig) => Some(rig.broadcast),
            _ => None,
        }
    }

    pub fn speech_state(&self) -> Option<SpeechState> {
        match self.equipment {
            EquipmentHeld::Microphone(rig) => Some(rig.speech),
            _ => None,
        }
    }

    pub fn zoom_active(&self) -> bool {
        matches!(
            self.broadcast_state(),
            Some(BroadcastState::OnAir { lens: Some(_) })
        )
    }

    pub fn work_time(&self) -> WorkTime {
        self.work_time
    }

    pub fn training_active(&self) -> bool {
        self.training.is_some()
    }

    pub fn rental(&self) -> &RentalState {
        &self.rental
    }

    pub fn outstanding_equipment(&self) -> u32 {
        self.ledger.outstanding()
    }

    pub fn last_work_vehicle(&self) -> Option<VehicleHandle> {
        self.last_work_vehicle
    }

    pub fn upload_in_flight(&self) -> bool {
        self.upload_in_flight
    }

    pub fn storage_access_in_flight(&self) -> bool {
        self.storage_access_in_flight
    }

    pub fn starting_health(&self) -> i32 {
        self.starting_health
    }

    pub fn observers_present(&self) -> bool {
        self.observers_present
    }

    pub fn background_tasks_armed(&self) -> bool {
        self.accrual.is_armed() && self.integrity.is_armed()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id,
            actor: self.actor,
            employment: self.employment,
            equipment: self.held_kind(),
            broadcast: self.broadcast_state().map(|b| b.label().to_string()),
            speech: self.speech_state(),
            zoom_active: self.zoom_active(),
            work_time: self.work_time,
            training: self.training,
            rental: self.rental,
            outstanding_equipment: self.ledger.outstanding(),
            upload_in_flight: self.upload_in_flight,
        }
    }

    /// Hands a rejected command's message to the presentation collaborator.
    pub fn report(&self, err: &dyn UserFacing) {
        self.notify(Notification::new(err.user_message(), err.severity()));
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.world.notify(self.actor, notification);
    }

    pub(crate) fn cue(&self, cue: PresentationCue) {
        self.world.cue(self.actor, cue);
    }

    pub(crate) fn is_near(&self, place: &crate::geometry::Place) -> bool {
        self.world.is_near(self.actor, place.position, place.radius)
    }
}

impl std::fmt::Debug for JobSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSession")
            .field("id", &self.id)
            .field("actor", &self.actor)
            .field("employment", &self.employment)
            .field("equipment", &self.equipment)
            .field("work_time", &self.work_time)
            .field("rental", &self.rental)
            .field("upload_in_flight", &self.upload_in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_states() {
        let prop = PropHandle(1);
        let now = Instant::now();
        let camera = |broadcast| {
            EquipmentHeld::Camera(CameraRig {
                prop,
                broadcast,
                crouched: false,
            })
        };

        assert!(!EquipmentHeld::None.is_working());
        assert!(!camera(BroadcastState::Idle).is_working());
        assert!(!camera(BroadcastState::Shouldering { ready_at: now }).is_working());
        assert!(camera(BroadcastState::Stopping { ready_at: now }).is_working());
        assert!(camera(BroadcastState::OnAir { lens: None }).is_working());
        assert!(
            !EquipmentHeld::Microphone(MicRig {
                prop,
                speech: SpeechState::Idle
            })
            .is_working()
        );
        assert!(
            EquipmentHeld::Microphone(MicRig {
                prop,
                speech: SpeechState::Interview
            })
            .is_working()
        );
    }

    #[test]
    fn test_rig_pose_tracks_state() {
        let rig = CameraRig {
            prop: PropHandle(2),
            broadcast: BroadcastState::Shouldered,
            crouched: true,
        };
        assert_eq!(rig.pose(), AttachPose::CAMERA_SHOULDER_CROUCHED);

        let mic = MicRig {
            prop: PropHandle(3),
            speech: SpeechState::Statement,
        };
        assert_eq!(mic.pose(), AttachPose::MIC_STATEMENT);
    }
}
