use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::EquipmentError;
use crate::world::{PoseCue, PresentationCue, VehicleHandle};

use super::model::{BroadcastState, CameraRig, EquipmentHeld, JobSession, MicRig, SpeechState};
use super::pose::{AttachPose, EquipmentKind};

/// A storage compartment access that is waiting out the bend-over delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageTicket {
    pub kind: EquipmentKind,
    pub delay: Duration,
    pub ready_at: Instant,
}

/// Outcome of a storage access that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAccess {
    Completed,
    /// Another access was already running; nothing happened.
    AlreadyInProgress,
}

impl JobSession {
    /// Starts taking `kind` out of the work vehicle's storage.
    ///
    /// Returns `Ok(None)` when a storage access is already in flight.
    pub fn begin_acquire(
        &mut self,
        kind: EquipmentKind,
        now: Instant,
    ) -> Result<Option<StorageTicket>, EquipmentError> {
        if self.storage_access_in_flight {
            return Ok(None);
        }
        if !self.is_employed() {
            return Err(EquipmentError::NotEmployed);
        }
        let snapshot = self.world.snapshot(self.actor);
        if self.equipment.is_held() || !snapshot.hands_empty {
            return Err(EquipmentError::AlreadyHolding);
        }
        if self.interruption_for(&snapshot).is_some() {
            return Err(EquipmentError::Interrupted);
        }
        self.storage_vehicle()?;

        Ok(Some(self.open_storage(kind, now)))
    }

    /// Finishes an acquire once its ticket is due.
    pub fn complete_acquire(
        &mut self,
        ticket: StorageTicket,
        _now: Instant,
    ) -> Result<(), EquipmentError> {
        self.close_storage();
        if !self.is_employed() {
            return Err(EquipmentError::NotEmployed);
        }
        if self.equipment.is_held() {
            return Err(EquipmentError::AlreadyHolding);
        }
        let snapshot = self.world.snapshot(self.actor);
        if self.interruption_for(&snapshot).is_some() {
            return Err(EquipmentError::Interrupted);
        }

        let kind = ticket.kind;
        let pose = AttachPose::in_hand(kind);
        let Some(prop) = self.world.spawn_prop(self.actor, kind, &pose) else {
            warn!(session_id = %self.id, actor = %self.actor, %kind, "Equipment prop failed to spawn");
            return Err(EquipmentError::CreationFailed);
        };
        self.world.attach(self.actor, prop, &pose);

        self.equipment = match kind {
            EquipmentKind::Camera => EquipmentHeld::Camera(CameraRig {
                prop,
                broadcast: BroadcastState::Idle,
                crouched: snapshot.crouched,
            }),
            EquipmentKind::Microphone => EquipmentHeld::Microphone(MicRig {
                prop,
                speech: SpeechState::Idle,
            }),
        };
        self.starting_health = snapshot.health;
        self.ledger.taken();

        if self.help_shown.insert(kind) {
            self.training = Some(kind.help_topic());
            self.training_ticks = 0;
            self.cue(PresentationCue::HelpText(kind.help_topic()));
        }

        info!(session_id = %self.id, actor = %self.actor, %kind, "Equipment taken out");
        Ok(())
    }

    /// Starts putting the held equipment back. `kind`, when given, must match it.
    pub fn begin_store(
        &mut self,
        kind: Option<EquipmentKind>,
        now: Instant,
    ) -> Result<Option<StorageTicket>, EquipmentError> {
        if self.storage_access_in_flight {
            return Ok(None);
        }
        if !self.is_employed() {
            return Err(EquipmentError::NotEmployed);
        }
        let held = self.held_kind().ok_or(EquipmentError::NothingHeld)?;
        if kind.is_some_and(|kind| kind != held) {
            return Err(EquipmentError::WrongEquipment);
        }
        self.storage_vehicle()?;

        Ok(Some(self.open_storage(held, now)))
    }

    /// Finishes a store once its ticket is due: deletes the prop and clears
    /// all work-state that belonged to it.
    pub fn complete_store(
        &mut self,
        ticket: StorageTicket,
        _now: Instant,
    ) -> Result<(), EquipmentError> {
        self.close_storage();
        // The equipment may have been dropped while bending over.
        if self.held_kind() != Some(ticket.kind) {
            return Err(EquipmentError::NothingHeld);
        }

        let held = std::mem::take(&mut self.equipment);
        if let EquipmentHeld::Camera(rig) = held {
            if rig.broadcast.is_live() {
                self.end_broadcast_presentation();
            }
        }
        if let Some(prop) = held.prop() {
            self.world.delete(prop);
        }
        self.next_accrual = None;
        self.ledger.stored();
        self.cue(PresentationCue::ClearPose);

        info!(session_id = %self.id, actor = %self.actor, kind = %ticket.kind, "Equipment stored");
        Ok(())
    }

    /// Runs a whole acquire without waiting out the storage delay.
    pub fn acquire(
        &mut self,
        kind: EquipmentKind,
        now: Instant,
    ) -> Result<StorageAccess, EquipmentError> {
        match self.begin_acquire(kind, now)? {
            Some(ticket) => {
                self.complete_acquire(ticket, ticket.ready_at)?;
                Ok(StorageAccess::Completed)
            }
            None => Ok(StorageAccess::AlreadyInProgress),
        }
    }

    /// Runs a whole store without waiting out the storage delay.
    pub fn store(
        &mut self,
        kind: Option<EquipmentKind>,
        now: Instant,
    ) -> Result<StorageAccess, EquipmentError> {
        match self.begin_store(kind, now)? {
            Some(ticket) => {
                self.complete_store(ticket, ticket.ready_at)?;
                Ok(StorageAccess::Completed)
            }
            None => Ok(StorageAccess::AlreadyInProgress),
        }
    }

    /// Recreates the held prop if the world lost it.
    pub fn ensure_presence(&mut self) {
        let (Some(prop), Some(kind), Some(pose)) = (
            self.equipment.prop(),
            self.equipment.kind(),
            self.equipment.pose(),
        ) else {
            return;
        };
        if self.world.exists(prop) {
            return;
        }

        match self.world.spawn_prop(self.actor, kind, &pose) {
            Some(replacement) => {
                self.world.attach(self.actor, replacement, &pose);
                self.equipment = self.equipment.with_prop(replacement);
                warn!(
                    session_id = %self.id,
                    actor = %self.actor,
                    %kind,
                    "Equipment prop vanished, recreated it"
                );
            }
            None => {
                error!(
                    session_id = %self.id,
                    actor = %self.actor,
                    %kind,
                    "Equipment prop vanished and could not be recreated"
                );
                self.drop_equipment();
            }
        }
    }

    /// The remembered work vehicle, if its storage is open and within reach.
    fn storage_vehicle(&self) -> Result<VehicleHandle, EquipmentError> {
        let vehicle = self
            .last_work_vehicle
            .filter(|v| self.world.vehicle_exists(*v) && self.world.is_work_vehicle(*v))
            .ok_or(EquipmentError::NotNearStorage)?;
        if !self.world.storage_open(vehicle) || !self.world.within_storage_reach(self.actor, vehicle)
        {
            return Err(EquipmentError::NotNearStorage);
        }
        Ok(vehicle)
    }

    fn open_storage(&mut self, kind: EquipmentKind, now: Instant) -> StorageTicket {
        let delay = self.config.timing.storage_access();
        self.storage_access_in_flight = true;
        self.cue(PresentationCue::Pose(PoseCue::BendToStorage));
        debug!(session_id = %self.id, %kind, ?delay, "Storage access started");
        StorageTicket {
            kind,
            delay,
            ready_at: now + delay,
        }
    }

    fn close_storage(&mut self) {
        self.storage_access_in_flight = false;
        self.cue(PresentationCue::ClearPose);
    }
}
