//! The per-actor job session and its state machines.

mod employment;
mod equipment;
mod evaluator;
mod interruption;
mod lens;
mod model;
mod payout;
mod pose;
mod rental;
mod schedule;
mod work;

#[cfg(test)]
mod scenario_test;
#[cfg(test)]
pub(crate) mod test_support;

pub use equipment::{StorageAccess, StorageTicket};
pub use interruption::{InterruptionCause, interruption_cause};
pub use lens::ZoomLens;
pub use model::{
    BroadcastState, CameraRig, EmploymentState, EquipmentHeld, JobSession, MicRig,
    SessionStatus, SpeechState, WorkTime,
};
pub use payout::{PayoutReceipt, UploadTicket};
pub use pose::{AttachPose, Bone, EquipmentKind};
pub use rental::{EquipmentLedger, RefundOutcome, RentalState};
pub use schedule::Cadence;
