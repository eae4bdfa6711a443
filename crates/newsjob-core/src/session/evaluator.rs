use std::time::Instant;

use tracing::{debug, trace};

use crate::world::{ActorSnapshot, PresentationCue};

use super::interruption::InterruptionCause;
use super::model::JobSession;

impl JobSession {
    /// The per-frame evaluator.
    ///
    /// Samples the actor once, enforces interruptions and settles timed
    /// transitions, then runs whichever background cadences are due. Returns
    /// the interruption that forced a reset in this cycle, if any.
    pub fn tick(&mut self, now: Instant) -> Option<InterruptionCause> {
        if !self.is_employed() {
            return None;
        }
        let snapshot = self.world.snapshot(self.actor);
        self.track_work_vehicle(&snapshot);

        let mut interrupted = None;
        if self.equipment.is_held() {
            if snapshot.health > self.starting_health {
                self.starting_health = snapshot.health;
            }
            match self.interruption_for(&snapshot) {
                Some(cause) => {
                    self.force_reset(cause);
                    interrupted = Some(cause);
                }
                None => self.advance_transitions(now, &snapshot),
            }
        }

        if self.integrity.poll(now) {
            self.ensure_presence();
            self.observers_present = snapshot.observers_nearby;
        }
        if self.accrual.poll(now) {
            self.training_tick();
            self.accrue(now);
        }
        interrupted
    }

    fn track_work_vehicle(&mut self, snapshot: &ActorSnapshot) {
        if snapshot.current_vehicle.is_some() {
            self.last_work_vehicle = None;
            return;
        }
        if let Some(remembered) = self.last_work_vehicle {
            if !self.world.vehicle_exists(remembered) {
                debug!(session_id = %self.id, vehicle = remembered.0, "Work vehicle vanished");
                self.last_work_vehicle = None;
            }
        }
        if let Some(left) = snapshot.last_vehicle {
            if self.last_work_vehicle != Some(left)
                && self.world.vehicle_exists(left)
                && self.world.is_work_vehicle(left)
            {
                trace!(session_id = %self.id, vehicle = left.0, "Remembering work vehicle");
                self.last_work_vehicle = Some(left);
            }
        }
    }

    fn training_tick(&mut self) {
        if self.training.is_none() {
            return;
        }
        self.training_ticks += 1;
        if self.training_ticks >= self.config.training_ticks {
            self.training = None;
            self.training_ticks = 0;
            self.cue(PresentationCue::ClearHelpText);
        }
    }
}
