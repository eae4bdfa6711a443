//! Player command use case.
//!
//! Every player input ends up here: chat commands, key-bound work controls
//! and location actions. Rejections never escape as errors. They are shown to
//! the player through the session's presenter and returned as
//! [`CommandOutcome::Rejected`] so callers can log or display them too.

use std::sync::Arc;

use newsjob_core::command::{Command, JobAction, WorkControl};
use newsjob_core::error::{NewsJobError, UploadError};
use newsjob_core::session::{EquipmentKind, PayoutReceipt, RefundOutcome, StorageAccess};
use newsjob_core::world::VehicleHandle;
use newsjob_core::ActorId;
use serde::Serialize;
use tracing::{debug, warn};

use crate::session::{SessionHandle, SessionRegistry};

/// What a player input resulted in.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    EquipmentTaken { kind: EquipmentKind },
    EquipmentStored,
    /// Another storage access was running; the input was ignored.
    StorageBusy,
    Uploaded { receipt: PayoutReceipt },
    HelpShown,
    ControlApplied { control: WorkControl },
    ClockedIn,
    ClockedOut,
    VehicleIssued { vehicle: VehicleHandle },
    VehicleReturned { outcome: RefundOutcome },
    Rejected { error: NewsJobError },
}

impl CommandOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Dispatches player input to the actor's session.
pub struct CommandUseCase {
    registry: Arc<SessionRegistry>,
}

impl CommandUseCase {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Parses and runs a chat command line.
    pub async fn execute_line(&self, actor: ActorId, line: &str) -> CommandOutcome {
        let handle = self.registry.get_or_create(actor).await;
        match Command::parse(line) {
            Ok(command) => self.run(&handle, command).await,
            Err(err) => self.reject(&handle, err.into()).await,
        }
    }

    pub async fn execute(&self, actor: ActorId, command: Command) -> CommandOutcome {
        let handle = self.registry.get_or_create(actor).await;
        self.run(&handle, command).await
    }

    async fn run(&self, handle: &SessionHandle, command: Command) -> CommandOutcome {
        debug!(actor = %handle.actor(), %command, "Running command");
        let result = match command {
            Command::GetEquipment(kind) => handle
                .acquire(kind)
                .await
                .map(|access| match access {
                    StorageAccess::Completed => CommandOutcome::EquipmentTaken { kind },
                    StorageAccess::AlreadyInProgress => CommandOutcome::StorageBusy,
                })
                .map_err(NewsJobError::from),
            Command::StoreEquipment(kind) => handle
                .store(kind)
                .await
                .map(|access| match access {
                    StorageAccess::Completed => CommandOutcome::EquipmentStored,
                    StorageAccess::AlreadyInProgress => CommandOutcome::StorageBusy,
                })
                .map_err(NewsJobError::from),
            Command::UploadReport => handle
                .upload()
                .await
                .map(|receipt| CommandOutcome::Uploaded { receipt })
                .map_err(NewsJobError::from),
            Command::EquipmentHelp => handle
                .show_equipment_help()
                .await
                .map(|()| CommandOutcome::HelpShown)
                .map_err(NewsJobError::from),
        };
        self.settle(handle, result).await
    }

    /// Applies a key-bound work control.
    pub async fn control(&self, actor: ActorId, control: WorkControl) -> CommandOutcome {
        let handle = self.registry.get_or_create(actor).await;
        let result = handle
            .control(control)
            .await
            .map(|()| CommandOutcome::ControlApplied { control })
            .map_err(NewsJobError::from);
        self.settle(&handle, result).await
    }

    /// Runs an action at headquarters or the rental desk.
    pub async fn action(&self, actor: ActorId, action: JobAction) -> CommandOutcome {
        let handle = self.registry.get_or_create(actor).await;
        let result = match action {
            JobAction::ClockIn => handle
                .clock_in()
                .await
                .map(|()| CommandOutcome::ClockedIn)
                .map_err(NewsJobError::from),
            JobAction::ClockOut => handle
                .clock_out()
                .await
                .map(|()| CommandOutcome::ClockedOut)
                .map_err(NewsJobError::from),
            JobAction::RentVehicle => handle
                .request_rental()
                .await
                .map(|vehicle| CommandOutcome::VehicleIssued { vehicle })
                .map_err(NewsJobError::from),
            JobAction::ReturnVehicle => handle
                .request_return()
                .await
                .map(|outcome| CommandOutcome::VehicleReturned { outcome })
                .map_err(NewsJobError::from),
        };
        self.settle(&handle, result).await
    }

    async fn settle(
        &self,
        handle: &SessionHandle,
        result: Result<CommandOutcome, NewsJobError>,
    ) -> CommandOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(err) => self.reject(handle, err).await,
        }
    }

    async fn reject(&self, handle: &SessionHandle, error: NewsJobError) -> CommandOutcome {
        warn!(actor = %handle.actor(), %error, "Command rejected");
        // A repeated upload request has no visible effect.
        let silent = matches!(
            error,
            NewsJobError::Upload(UploadError::AlreadyUploading)
        );
        if let (false, Some(user_facing)) = (silent, error.as_user_facing()) {
            handle.report(user_facing).await;
        }
        CommandOutcome::Rejected { error }
    }
}
