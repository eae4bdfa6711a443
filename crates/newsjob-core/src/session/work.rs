use std::time::Instant;

use tracing::{debug, info};

use crate::error::WorkStateError;
use crate::world::{ActorSnapshot, Notification, PoseCue, PresentationCue};

use super::lens::ZoomLens;
use super::model::{BroadcastState, CameraRig, EquipmentHeld, JobSession, SpeechState};
use super::pose::AttachPose;

impl JobSession {
    /// Idle <-> Shouldered. Leaving the shoulder while live ends the broadcast.
    pub fn toggle_shoulder(&mut self, now: Instant) -> Result<(), WorkStateError> {
        let mut rig = self.camera_for_toggle()?;
        let snapshot = self.world.snapshot(self.actor);

        rig.broadcast = match rig.broadcast {
            BroadcastState::Idle => {
                rig.crouched = snapshot.crouched;
                self.world
                    .attach(self.actor, rig.prop, &AttachPose::camera_shoulder(rig.crouched));
                self.cue(PresentationCue::Pose(PoseCue::ShoulderCamera));
                BroadcastState::Shouldering {
                    ready_at: now + self.config.timing.shoulder_settle(),
                }
            }
            BroadcastState::Shouldered | BroadcastState::OnAir { .. } => {
                if rig.broadcast.is_on_air() {
                    self.end_broadcast_presentation();
                }
                self.world
                    .attach(self.actor, rig.prop, &AttachPose::CAMERA_IN_HAND);
                self.cue(PresentationCue::ClearPose);
                BroadcastState::Idle
            }
            BroadcastState::Shouldering { .. }
            | BroadcastState::Starting { .. }
            | BroadcastState::Stopping { .. } => {
                return Err(WorkStateError::TransitionInProgress);
            }
        };

        debug!(session_id = %self.id, state = rig.broadcast.label(), "Shoulder toggled");
        self.equipment = EquipmentHeld::Camera(rig);
        Ok(())
    }

    /// Shouldered -> OnAir and back, through a timed start/stop sequence.
    pub fn toggle_on_air(&mut self, now: Instant) -> Result<(), WorkStateError> {
        let mut rig = self.camera_for_toggle()?;
        let ready_at = now + self.config.timing.broadcast_transition();

        rig.broadcast = match rig.broadcast {
            BroadcastState::Shouldered => {
                self.cue(PresentationCue::ScreenFadeOut);
                BroadcastState::Starting { ready_at }
            }
            BroadcastState::OnAir { .. } => {
                self.cue(PresentationCue::ScreenFadeOut);
                BroadcastState::Stopping { ready_at }
            }
            BroadcastState::Idle => return Err(WorkStateError::NotShouldered),
            BroadcastState::Shouldering { .. }
            | BroadcastState::Starting { .. }
            | BroadcastState::Stopping { .. } => {
                return Err(WorkStateError::TransitionInProgress);
            }
        };

        debug!(session_id = %self.id, state = rig.broadcast.label(), "Broadcast toggled");
        self.equipment = EquipmentHeld::Camera(rig);
        Ok(())
    }

    /// Turns the zoom camera off or back on while live.
    pub fn toggle_zoom(&mut self, _now: Instant) -> Result<(), WorkStateError> {
        let mut rig = self.camera_for_toggle()?;
        let BroadcastState::OnAir { lens } = rig.broadcast else {
            return Err(WorkStateError::NotOnAir);
        };

        let lens = match lens {
            Some(_) => None,
            None => Some(ZoomLens::new(&self.config.lens)),
        };
        self.cue(PresentationCue::ZoomCamera(lens.map(|lens| lens.view())));
        rig.broadcast = BroadcastState::OnAir { lens };
        self.equipment = EquipmentHeld::Camera(rig);
        Ok(())
    }

    pub fn zoom_in(&mut self) -> Result<(), WorkStateError> {
        let config = self.config.lens.clone();
        self.adjust_lens(|lens| lens.zoom_in(&config))
    }

    pub fn zoom_out(&mut self) -> Result<(), WorkStateError> {
        let config = self.config.lens.clone();
        self.adjust_lens(|lens| lens.zoom_out(&config))
    }

    /// Rotates the zoom camera by `dx` degrees of yaw and `dy` degrees of pitch.
    pub fn look(&mut self, dx: f32, dy: f32) -> Result<(), WorkStateError> {
        let config = self.config.lens.clone();
        self.adjust_lens(|lens| lens.look(dx, dy, &config))
    }

    pub fn toggle_statement(&mut self, now: Instant) -> Result<(), WorkStateError> {
        self.toggle_speech(SpeechState::Statement, now)
    }

    pub fn toggle_interview(&mut self, now: Instant) -> Result<(), WorkStateError> {
        self.toggle_speech(SpeechState::Interview, now)
    }

    fn toggle_speech(&mut self, target: SpeechState, now: Instant) -> Result<(), WorkStateError> {
        self.ensure_no_interruption()?;
        let EquipmentHeld::Microphone(mut rig) = self.equipment else {
            return Err(WorkStateError::WrongEquipment);
        };

        rig.speech = if rig.speech == target {
            SpeechState::Idle
        } else {
            target
        };
        self.world.attach(self.actor, rig.prop, &rig.pose());
        match rig.speech {
            SpeechState::Idle => self.cue(PresentationCue::ClearPose),
            SpeechState::Statement => {
                self.cue(PresentationCue::Pose(PoseCue::HoldStatement));
                self.next_accrual = Some(now + self.config.timing.accrual_step());
            }
            SpeechState::Interview => {
                self.cue(PresentationCue::Pose(PoseCue::HoldInterview));
                self.next_accrual = Some(now + self.config.timing.accrual_step());
            }
        }

        debug!(session_id = %self.id, speech = ?rig.speech, "Speech toggled");
        self.equipment = EquipmentHeld::Microphone(rig);
        Ok(())
    }

    /// Settles timed broadcast transitions and re-poses the camera on stance changes.
    pub(crate) fn advance_transitions(&mut self, now: Instant, snapshot: &ActorSnapshot) {
        let EquipmentHeld::Camera(mut rig) = self.equipment else {
            return;
        };

        match rig.broadcast {
            BroadcastState::Shouldering { ready_at } if now >= ready_at => {
                rig.broadcast = BroadcastState::Shouldered;
                self.next_accrual = Some(now + self.config.timing.accrual_step());
            }
            BroadcastState::Starting { ready_at } if now >= ready_at => {
                let lens = ZoomLens::new(&self.config.lens);
                self.cue(PresentationCue::NewsOverlay { visible: true });
                self.cue(PresentationCue::ZoomCamera(Some(lens.view())));
                self.cue(PresentationCue::ScreenFadeIn);
                rig.broadcast = BroadcastState::OnAir { lens: Some(lens) };
                self.next_accrual = Some(now + self.config.timing.accrual_step());
                info!(session_id = %self.id, actor = %self.actor, "Broadcast on air");
            }
            BroadcastState::Stopping { ready_at } if now >= ready_at => {
                self.end_broadcast_presentation();
                rig.broadcast = BroadcastState::Shouldered;
                self.next_accrual = Some(now + self.config.timing.accrual_step());
                info!(session_id = %self.id, actor = %self.actor, "Broadcast off air");
            }
            _ => {}
        }

        if rig.broadcast.is_shouldered() && rig.crouched != snapshot.crouched {
            rig.crouched = snapshot.crouched;
            self.world.attach(self.actor, rig.prop, &rig.pose());
        }

        self.equipment = EquipmentHeld::Camera(rig);
    }

    /// One accrual cadence step. The only writer of the work-time accumulator.
    ///
    /// Seconds are credited against fixed one-second deadlines, so frame
    /// timing never stretches or shrinks the recorded time.
    pub(crate) fn accrue(&mut self, now: Instant) {
        if self.upload_in_flight || !self.equipment.is_working() {
            self.next_accrual = None;
            return;
        }
        if let Some(until) = self.storage_full_until {
            if now < until {
                return;
            }
            self.storage_full_until = None;
        }

        let step = self.config.timing.accrual_step();
        let mut due = *self.next_accrual.get_or_insert(now + step);
        while now >= due {
            due += step;
            self.next_accrual = Some(due);
            if self.observers_present && !self.credit_second(now) {
                // Storage full: the cooldown restarts the deadline.
                self.next_accrual = None;
                return;
            }
        }
    }

    /// Adds one recorded second. Returns false once the storage is full.
    fn credit_second(&mut self, now: Instant) -> bool {
        self.work_time.seconds += 1;
        if self.work_time.seconds < 60 {
            return true;
        }
        self.work_time.seconds = 0;

        let cap = self.config.economy.max_recording_minutes;
        if self.work_time.minutes >= cap {
            self.storage_full_until = Some(now + self.config.timing.storage_full_cooldown());
            self.notify(Notification::warning(
                "Your media storage is full. Upload your footage back to HQ.",
            ));
            info!(session_id = %self.id, actor = %self.actor, cap, "Media storage full");
            return false;
        }
        self.work_time.minutes += 1;
        debug!(
            session_id = %self.id,
            minutes = self.work_time.minutes,
            "Work minute recorded"
        );
        true
    }

    fn camera_for_toggle(&mut self) -> Result<CameraRig, WorkStateError> {
        self.ensure_no_interruption()?;
        match self.equipment {
            EquipmentHeld::Camera(rig) => Ok(rig),
            _ => Err(WorkStateError::WrongEquipment),
        }
    }

    fn adjust_lens(&mut self, adjust: impl FnOnce(&mut ZoomLens)) -> Result<(), WorkStateError> {
        let EquipmentHeld::Camera(mut rig) = self.equipment else {
            return Err(WorkStateError::WrongEquipment);
        };
        let BroadcastState::OnAir {
            lens: Some(mut lens),
        } = rig.broadcast
        else {
            return Err(WorkStateError::NotOnAir);
        };

        adjust(&mut lens);
        self.cue(PresentationCue::ZoomCamera(Some(lens.view())));
        rig.broadcast = BroadcastState::OnAir { lens: Some(lens) };
        self.equipment = EquipmentHeld::Camera(rig);
        Ok(())
    }

    /// Toggles are refused while off duty; an interruption resets and refuses.
    fn ensure_no_interruption(&mut self) -> Result<(), WorkStateError> {
        if !self.is_employed() {
            return Err(WorkStateError::NotEmployed);
        }
        let snapshot = self.world.snapshot(self.actor);
        if let Some(cause) = self.interruption_for(&snapshot) {
            self.force_reset(cause);
            return Err(WorkStateError::Interrupted);
        }
        Ok(())
    }
}
