use std::time::Instant;

use tracing::info;

use crate::error::{CommandError, EmploymentError};
use crate::world::{HelpTopic, Notification, PresentationCue};

use super::model::{EmploymentState, JobSession, WorkTime};

impl JobSession {
    /// Starts a shift at headquarters.
    pub fn clock_in(&mut self, now: Instant) -> Result<(), EmploymentError> {
        if self.is_employed() {
            return Err(EmploymentError::AlreadyEmployed);
        }
        if !self.is_near(&self.config.places.headquarters) {
            return Err(EmploymentError::NotAtHeadquarters);
        }

        self.reset_shift();
        self.employment = EmploymentState::Employed;
        self.accrual.arm(now);
        self.integrity.arm(now);
        self.training = Some(HelpTopic::Job);
        self.cue(PresentationCue::HelpText(HelpTopic::Job));
        self.notify(Notification::success(
            "Welcome to the news crew. Rent a van out back to get started.",
        ));

        info!(session_id = %self.id, actor = %self.actor, "Clocked in");
        Ok(())
    }

    /// Ends a shift at headquarters once the briefing is over.
    pub fn clock_out(&mut self, _now: Instant) -> Result<(), EmploymentError> {
        if !self.is_employed() {
            return Err(EmploymentError::NotEmployed);
        }
        if !self.is_near(&self.config.places.headquarters) {
            return Err(EmploymentError::NotAtHeadquarters);
        }
        if self.training_active() {
            return Err(EmploymentError::InTraining);
        }

        self.end_shift();
        self.notify(Notification::info("You are no longer working for the news crew."));
        info!(session_id = %self.id, actor = %self.actor, "Clocked out");
        Ok(())
    }

    /// Ends the shift unconditionally, e.g. when the connection drops.
    ///
    /// The rental survives so the vehicle can still be returned later.
    pub fn teardown(&mut self) {
        if !self.is_employed() {
            return;
        }
        self.end_shift();
        info!(session_id = %self.id, actor = %self.actor, "Session torn down");
    }

    /// Shows the manual for the held equipment again.
    pub fn show_equipment_help(&mut self) -> Result<(), CommandError> {
        if !self.is_employed() || self.training_active() {
            return Err(CommandError::HelpUnavailable);
        }
        let kind = self.held_kind().ok_or(CommandError::HelpUnavailable)?;

        self.training = Some(kind.help_topic());
        self.training_ticks = 0;
        self.cue(PresentationCue::HelpText(kind.help_topic()));
        Ok(())
    }

    fn end_shift(&mut self) {
        self.drop_equipment();
        self.accrual.disarm();
        self.integrity.disarm();
        self.upload_in_flight = false;
        self.storage_access_in_flight = false;
        if self.training.take().is_some() {
            self.cue(PresentationCue::ClearHelpText);
        }
        self.employment = EmploymentState::Unemployed;
    }

    fn reset_shift(&mut self) {
        self.work_time = WorkTime::default();
        self.starting_health = 0;
        self.observers_present = false;
        self.training = None;
        self.training_ticks = 0;
        self.help_shown.clear();
        self.last_work_vehicle = None;
        self.upload_in_flight = false;
        self.storage_access_in_flight = false;
        self.next_accrual = None;
        self.storage_full_until = None;
    }
}
