use std::collections::HashMap;
use std::sync::Arc;

use newsjob_core::session::InterruptionCause;
use newsjob_core::{ActorId, JobConfig, JobSession, JobWorld};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::handle::{SessionHandle, now};

/// Owns the one job session each actor has.
///
/// Sessions are created on first use and live until the actor disconnects.
/// Handles are cheap to clone and can be used from any task.
pub struct SessionRegistry {
    config: Arc<JobConfig>,
    world: Arc<dyn JobWorld>,
    sessions: Arc<RwLock<HashMap<ActorId, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(config: Arc<JobConfig>, world: Arc<dyn JobWorld>) -> Self {
        Self {
            config,
            world,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &Arc<JobConfig> {
        &self.config
    }

    /// Gets the session of `actor`, if one exists.
    pub async fn get(&self, actor: ActorId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(&actor).cloned()
    }

    /// Gets the session of `actor`, creating a fresh off-duty one if needed.
    pub async fn get_or_create(&self, actor: ActorId) -> SessionHandle {
        if let Some(handle) = self.get(actor).await {
            return handle;
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have created it between the two locks.
        sessions
            .entry(actor)
            .or_insert_with(|| {
                let session = JobSession::new(actor, self.config.clone(), self.world.clone());
                debug!(session_id = %session.id(), %actor, "Session created");
                SessionHandle::new(session)
            })
            .clone()
    }

    /// Registers a prepared session, replacing any previous one for its actor.
    pub async fn insert(&self, session: JobSession) -> SessionHandle {
        let handle = SessionHandle::new(session);
        let mut sessions = self.sessions.write().await;
        sessions.insert(handle.actor(), handle.clone());
        handle
    }

    /// Tears down and forgets the session of a disconnecting actor.
    pub async fn remove(&self, actor: ActorId) -> Option<SessionHandle> {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&actor)
        };
        if let Some(handle) = &removed {
            handle.teardown().await;
            info!(%actor, "Session removed");
        }
        removed
    }

    pub async fn actors(&self) -> Vec<ActorId> {
        let sessions = self.sessions.read().await;
        let mut actors: Vec<_> = sessions.keys().copied().collect();
        actors.sort();
        actors
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Runs one evaluator cycle on every session.
    ///
    /// Returns the actors whose equipment was stripped by an interruption.
    pub async fn tick_all(&self) -> Vec<(ActorId, InterruptionCause)> {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let at = now();
        let mut interrupted = Vec::new();
        for handle in handles {
            if let Some(cause) = handle.tick_at(at).await {
                interrupted.push((handle.actor(), cause));
            }
        }
        interrupted
    }

    /// Tears down every session. Used on shutdown.
    pub async fn clear(&self) {
        let drained: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        for handle in drained {
            handle.teardown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsjob_core::session::EmploymentState;
    use newsjob_infrastructure::SimulatedWorld;

    fn registry() -> (Arc<SimulatedWorld>, SessionRegistry) {
        let config = Arc::new(JobConfig::default());
        let world = Arc::new(SimulatedWorld::new(config.clone()));
        let registry = SessionRegistry::new(config, world.clone());
        (world, registry)
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let (_world, registry) = registry();
        let actor = ActorId(7);

        assert!(registry.get(actor).await.is_none());
        let first = registry.get_or_create(actor).await;
        let second = registry.get_or_create(actor).await;

        assert_eq!(first.session_id().await, second.session_id().await);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.actors().await, vec![actor]);
    }

    #[tokio::test]
    async fn test_remove_tears_down_shift() {
        let (world, registry) = registry();
        let actor = ActorId(7);
        world.place_at_headquarters(actor);
        let handle = registry.get_or_create(actor).await;
        handle.clock_in().await.unwrap();

        let removed = registry.remove(actor).await.unwrap();

        assert_eq!(
            removed.status().await.employment,
            EmploymentState::Unemployed
        );
        assert!(registry.is_empty().await);
        assert!(registry.remove(actor).await.is_none());
    }
}
