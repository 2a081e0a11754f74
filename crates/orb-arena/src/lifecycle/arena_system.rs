use crate::clients::SessionClient;
use crate::config::ArenaConfig;
use crate::fleet::Fleet;
use crate::model::SessionSnapshot;
use crate::orchestrator::{ArenaError, Orchestrator, OrchestratorContext};
use arena_actor::Actor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A running session.
pub struct ArenaSystem {
    pub client: SessionClient,
    handle: JoinHandle<Orchestrator>,
}

impl ArenaSystem {
    /// Spawns the session actor. Must be called inside a Tokio runtime. Orbs
    /// the fleet already holds are registered before the first message is
    /// handled.
    pub fn start(fleet: Arc<dyn Fleet>, config: ArenaConfig) -> Self {
        info!(?config, "Starting arena");
        let (actor, mailbox) = Actor::new(Orchestrator::new(config));
        let context = OrchestratorContext {
            fleet,
            mailbox: mailbox.downgrade(),
        };
        let handle = tokio::spawn(actor.run(context));

        Self {
            client: SessionClient::new(mailbox),
            handle,
        }
    }

    /// Drops this system's client and waits for the actor to finish.
    pub async fn shutdown(self) -> Result<SessionSnapshot, ArenaError> {
        drop(self.client);
        let orchestrator = self.handle.await.map_err(|e| {
            error!(error = %e, "Session actor failed");
            ArenaError::ActorCommunication(e.to_string())
        })?;
        info!("Arena stopped");
        Ok(orchestrator.store().snapshot())
    }
}
