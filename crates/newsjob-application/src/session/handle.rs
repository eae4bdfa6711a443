use std::sync::Arc;
use std::time::Instant;

use newsjob_core::command::WorkControl;
use newsjob_core::error::{
    CommandError, EmploymentError, EquipmentError, RentalError, UploadError, UserFacing,
    WorkStateError,
};
use newsjob_core::session::{
    EquipmentKind, InterruptionCause, PayoutReceipt, RefundOutcome, SessionStatus, StorageAccess,
};
use newsjob_core::world::VehicleHandle;
use newsjob_core::{ActorId, JobSession};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

/// Current instant on the tokio clock, so paused test time drives sessions too.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Shared access to one actor's session.
///
/// Operations with a real-time delay lock the session to begin, sleep with
/// the lock released, and lock again to complete. The ticker keeps running
/// interruption checks in between.
#[derive(Clone)]
pub struct SessionHandle {
    actor: ActorId,
    session: Arc<Mutex<JobSession>>,
}

impl SessionHandle {
    pub fn new(session: JobSession) -> Self {
        Self {
            actor: session.actor(),
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub async fn session_id(&self) -> Uuid {
        self.session.lock().await.id()
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    /// Runs `f` with the session locked.
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut JobSession) -> R) -> R {
        let mut session = self.session.lock().await;
        f(&mut session)
    }

    /// Shows a rejection to the player.
    pub async fn report(&self, err: &dyn UserFacing) {
        self.session.lock().await.report(err);
    }

    pub async fn clock_in(&self) -> Result<(), EmploymentError> {
        self.session.lock().await.clock_in(now())
    }

    pub async fn clock_out(&self) -> Result<(), EmploymentError> {
        self.session.lock().await.clock_out(now())
    }

    pub async fn teardown(&self) {
        self.session.lock().await.teardown();
    }

    pub async fn request_rental(&self) -> Result<VehicleHandle, RentalError> {
        self.session.lock().await.request_rental()
    }

    pub async fn request_return(&self) -> Result<RefundOutcome, RentalError> {
        self.session.lock().await.request_return()
    }

    /// Takes `kind` out of the work vehicle's storage.
    ///
    /// A prop that fails to spawn is retried once before giving up.
    pub async fn acquire(&self, kind: EquipmentKind) -> Result<StorageAccess, EquipmentError> {
        match self.acquire_once(kind).await {
            Err(EquipmentError::CreationFailed) => {
                debug!(actor = %self.actor, %kind, "Retrying equipment spawn");
                self.acquire_once(kind).await
            }
            result => result,
        }
    }

    async fn acquire_once(&self, kind: EquipmentKind) -> Result<StorageAccess, EquipmentError> {
        let ticket = self.session.lock().await.begin_acquire(kind, now())?;
        let Some(ticket) = ticket else {
            return Ok(StorageAccess::AlreadyInProgress);
        };

        sleep(ticket.delay).await;

        self.session
            .lock()
            .await
            .complete_acquire(ticket, now())
            .map(|()| StorageAccess::Completed)
    }

    /// Puts the held equipment back into the work vehicle's storage.
    pub async fn store(
        &self,
        kind: Option<EquipmentKind>,
    ) -> Result<StorageAccess, EquipmentError> {
        let ticket = self.session.lock().await.begin_store(kind, now())?;
        let Some(ticket) = ticket else {
            return Ok(StorageAccess::AlreadyInProgress);
        };

        sleep(ticket.delay).await;

        self.session
            .lock()
            .await
            .complete_store(ticket, now())
            .map(|()| StorageAccess::Completed)
    }

    /// Uploads the recorded work time and waits out the transfer.
    pub async fn upload(&self) -> Result<PayoutReceipt, UploadError> {
        let ticket = self.session.lock().await.begin_upload(now())?;

        sleep(ticket.delay).await;

        let result = self.session.lock().await.complete_upload(ticket, now());
        if let Err(err) = &result {
            warn!(actor = %self.actor, %err, "Upload did not complete");
        }
        result
    }

    pub async fn show_equipment_help(&self) -> Result<(), CommandError> {
        self.session.lock().await.show_equipment_help()
    }

    /// Applies a key-bound work control.
    pub async fn control(&self, control: WorkControl) -> Result<(), WorkStateError> {
        let at = now();
        let mut session = self.session.lock().await;
        match control {
            WorkControl::ToggleShoulder => session.toggle_shoulder(at),
            WorkControl::ToggleOnAir => session.toggle_on_air(at),
            WorkControl::ToggleZoom => session.toggle_zoom(at),
            WorkControl::ToggleStatement => session.toggle_statement(at),
            WorkControl::ToggleInterview => session.toggle_interview(at),
            WorkControl::ZoomIn => session.zoom_in(),
            WorkControl::ZoomOut => session.zoom_out(),
        }
    }

    pub async fn look(&self, dx: f32, dy: f32) -> Result<(), WorkStateError> {
        self.session.lock().await.look(dx, dy)
    }

    pub async fn tick(&self) -> Option<InterruptionCause> {
        self.tick_at(now()).await
    }

    pub(crate) async fn tick_at(&self, at: Instant) -> Option<InterruptionCause> {
        self.session.lock().await.tick(at)
    }
}
