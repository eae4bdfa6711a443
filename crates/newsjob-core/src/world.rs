//! Collaborator contracts between the session and the surrounding game.
//!
//! The session never renders, spawns or moves money itself. It samples the
//! actor through [`ActorLookup`], asks [`Proximity`] about places, manipulates
//! props and vehicles through opaque handles, and emits fire-and-forget
//! requests to [`Economy`] and [`Presenter`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{SpawnSlot, Vec3};
use crate::session::{AttachPose, EquipmentKind};

/// Identity of the player a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Opaque handle to a spawned equipment prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropHandle(pub u32);

/// Opaque handle to a vehicle in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleHandle(pub u32);

/// Where the player's money is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[default]
    Debit,
}

/// Everything the session needs to know about the actor for one evaluator cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub position: Vec3,
    pub health: i32,
    /// No weapon or other item occupies the actor's hands.
    pub hands_empty: bool,
    pub current_vehicle: Option<VehicleHandle>,
    pub is_driving: bool,
    /// The vehicle the actor most recently left.
    pub last_vehicle: Option<VehicleHandle>,
    /// Playing an ambient, arrest or hands-up scenario.
    pub in_scenario: bool,
    pub restrained: bool,
    pub submerged: bool,
    pub climbing: bool,
    pub airborne: bool,
    pub crouched: bool,
    /// Other people are close enough to count as an audience.
    pub observers_nearby: bool,
    pub payment_method: PaymentMethod,
    /// Balance held in `payment_method`.
    pub balance: i64,
}

impl Default for ActorSnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            health: 200,
            hands_empty: true,
            current_vehicle: None,
            is_driving: false,
            last_vehicle: None,
            in_scenario: false,
            restrained: false,
            submerged: false,
            climbing: false,
            airborne: false,
            crouched: false,
            observers_nearby: false,
            payment_method: PaymentMethod::Debit,
            balance: 0,
        }
    }
}

/// Request to take money from the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRequest {
    pub actor: ActorId,
    pub method: PaymentMethod,
    pub amount: u32,
}

/// Label attached to a payment so the economy backend can audit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    JobSubmission,
    DepositReturn,
}

impl PaymentSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::JobSubmission => "NewsJobSubmission",
            Self::DepositReturn => "NewsDepositReturn",
        }
    }

    fn event_tag(&self) -> &'static str {
        match self {
            Self::JobSubmission => "NEWSJOBSUBMISSION",
            Self::DepositReturn => "NEWSDEPOSITRETURN",
        }
    }
}

/// Request to pay the actor by direct deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub actor: ActorId,
    pub amount: u32,
    pub source: PaymentSource,
    pub method: PaymentMethod,
    pub event_timestamp: DateTime<Utc>,
    pub event_data: String,
}

impl PaymentRequest {
    pub fn direct_deposit(
        actor: ActorId,
        amount: u32,
        source: PaymentSource,
        event_timestamp: DateTime<Utc>,
    ) -> Self {
        let event_data = format!(
            "PAYMENT|{}|SUCCESS|TS1={}|A={}",
            source.event_tag(),
            event_timestamp.to_rfc3339(),
            amount
        );
        Self {
            actor,
            amount,
            source,
            method: PaymentMethod::Debit,
            event_timestamp,
            event_data,
        }
    }
}

/// Severity of a player-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the player. The session only supplies text and severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }
}

/// Which help text the presentation layer should keep on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelpTopic {
    Job,
    Camera,
    Microphone,
}

/// Body animation requested from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseCue {
    BendToStorage,
    ShoulderCamera,
    HoldStatement,
    HoldInterview,
}

/// Current view of the zoom camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensView {
    pub fov: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Presentation side effects. Rendering them is someone else's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PresentationCue {
    HelpText(HelpTopic),
    ClearHelpText,
    Pose(PoseCue),
    ClearPose,
    ScreenFadeOut,
    ScreenFadeIn,
    NewsOverlay { visible: bool },
    /// `Some` while the zoom camera renders, `None` once it is torn down.
    ZoomCamera(Option<LensView>),
}

/// How a rental vehicle must be configured when it is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalVehicleSpec {
    pub renter: ActorId,
    pub model: String,
    pub livery: u8,
    pub plate_prefix: char,
    pub slot: SpawnSlot,
    pub fuel: f32,
    /// Rentals are job-scoped business vehicles, never player property.
    pub purchasable: bool,
    pub locked: bool,
    pub engine_running: bool,
    pub persistent: bool,
}

/// Samples the actor once per evaluator cycle.
pub trait ActorLookup: Send + Sync {
    fn snapshot(&self, actor: ActorId) -> ActorSnapshot;
}

/// Answers "is the actor near this point".
pub trait Proximity: Send + Sync {
    fn is_near(&self, actor: ActorId, point: Vec3, radius: f32) -> bool;
}

/// Physical equipment props, referenced only by handle.
pub trait PropWorld: Send + Sync {
    /// Creates the prop at the actor's hand. `None` when the model cannot be loaded.
    fn spawn_prop(&self, actor: ActorId, kind: EquipmentKind, pose: &AttachPose)
    -> Option<PropHandle>;
    fn attach(&self, actor: ActorId, prop: PropHandle, pose: &AttachPose);
    fn detach(&self, prop: PropHandle);
    fn delete(&self, prop: PropHandle);
    fn exists(&self, prop: PropHandle) -> bool;
}

/// Vehicles, rental slots and vehicle storage compartments.
pub trait VehicleWorld: Send + Sync {
    /// Whether a slot is taken right now. Slots are shared with other actors.
    fn slot_occupied(&self, slot: &SpawnSlot) -> bool;
    fn spawn_rental(&self, spec: &RentalVehicleSpec) -> Option<VehicleHandle>;
    fn vehicle_exists(&self, vehicle: VehicleHandle) -> bool;
    fn is_work_vehicle(&self, vehicle: VehicleHandle) -> bool;
    fn register_work_vehicle(&self, vehicle: VehicleHandle);
    /// Rear compartment doors are open or broken.
    fn storage_open(&self, vehicle: VehicleHandle) -> bool;
    fn within_storage_reach(&self, actor: ActorId, vehicle: VehicleHandle) -> bool;
    fn passenger_count(&self, vehicle: VehicleHandle) -> usize;
    fn order_driver_out(&self, actor: ActorId, vehicle: VehicleHandle);
    fn order_passengers_out(&self, vehicle: VehicleHandle);
    fn remove_vehicle(&self, vehicle: VehicleHandle);
}

/// The money backend. Requests are fire-and-forget.
pub trait Economy: Send + Sync {
    fn request_deduction(&self, request: DeductionRequest);
    fn request_payment(&self, request: PaymentRequest);
}

/// Player-facing output.
pub trait Presenter: Send + Sync {
    fn notify(&self, actor: ActorId, notification: Notification);
    fn cue(&self, actor: ActorId, cue: PresentationCue);
}

/// Everything a session talks to.
pub trait JobWorld: ActorLookup + Proximity + PropWorld + VehicleWorld + Economy + Presenter {}

impl<T> JobWorld for T where T: ActorLookup + Proximity + PropWorld + VehicleWorld + Economy + Presenter
{}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payment_event_data_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let request =
            PaymentRequest::direct_deposit(ActorId(3), 120, PaymentSource::JobSubmission, at);

        assert_eq!(request.method, PaymentMethod::Debit);
        assert_eq!(request.source.label(), "NewsJobSubmission");
        assert_eq!(
            request.event_data,
            "PAYMENT|NEWSJOBSUBMISSION|SUCCESS|TS1=2024-05-01T12:00:00+00:00|A=120"
        );
    }

    #[test]
    fn test_actor_id_display() {
        assert_eq!(ActorId(42).to_string(), "actor-42");
    }
}
