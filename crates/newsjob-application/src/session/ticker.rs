use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::SessionRegistry;

/// Drives the per-frame evaluator of every registered session.
///
/// Cadence-based work (accrual, integrity checks) is timed inside each
/// session against absolute deadlines, so a late frame only delays it.
pub struct SessionTicker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionTicker {
    /// Starts ticking `registry` every `period` on the current runtime.
    pub fn spawn(registry: Arc<SessionRegistry>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = period.as_millis() as u64, "Session ticker started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        for (actor, cause) in registry.tick_all().await {
                            debug!(%actor, %cause, "Equipment stripped by interruption");
                        }
                    }
                }
            }

            info!("Session ticker stopped");
        });

        Self { cancel, task }
    }

    /// Starts ticking at the configured frame interval.
    pub fn spawn_default(registry: Arc<SessionRegistry>) -> Self {
        let period = registry.config().timing.frame_interval();
        Self::spawn(registry, period)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        // A panicked tick loop has nothing left to clean up.
        let _ = self.task.await;
    }
}
