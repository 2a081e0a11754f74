//! # Game Orchestrator
//!
//! The single writer of the session. [`Orchestrator`] is an
//! [`arena_actor::Handler`] that owns the [`SessionStore`], the controller
//! sessions and the orb registry, so every operator edit, controller event and
//! hardware interrupt is applied to all three tables in one uninterrupted step.
//!
//! ## Event flow
//!
//! ```text
//! operator ──► SessionStore ──(StoreEvent)──► follow-up queue ─┐
//!                  ▲                                           │
//! controllers ─────┤◄──────────── Orchestrator ◄──────────────┘
//! fleet/hardware ──┘                    │
//!                                       └──► controller pushes, fleet calls
//! ```
//!
//! The store raises [`StoreEvent`]s synchronously. The orchestrator's
//! subscriptions only queue them; the queue is drained right after the message
//! that raised them and before the next one is taken from the mailbox.
//!
//! ## Background work
//!
//! Connecting, tearing down and battery queries go through the [`Fleet`] on
//! spawned tasks that post their outcome back as a [`SessionEvent`]. They hold a
//! [`WeakMailbox`] so an idle fleet call never keeps the actor alive. Each
//! connect carries a request id; an outcome that no longer matches the pending
//! table is discarded and its orb torn down.
//!
//! Commands are checked against the linked orb inside the actor, then handed
//! to the controller's outbox task, which sends them in order under
//! [`ArenaConfig::command_timeout`]. A slow driver never holds up the mailbox.

mod error;
mod events;
mod registry;
pub mod rules;

pub use error::ArenaError;
pub use events::SessionEvent;
pub use registry::{
    CommandOutbox, ControllerRegistry, ControllerSession, ControllerStatus, OrbCommand, OrbEntry,
    OrbRegistry,
};

use crate::channels::{
    CommandIntent, CommandStream, ControllerChannel, ControllerMessage, OperatorChannel, OperatorId,
};
use crate::config::ArenaConfig;
use crate::fleet::{Fleet, FleetError, SharedOrb};
use crate::model::{BatteryLevel, ControllerKey, OrbName, OrbSummary};
use crate::store::{SessionStore, StoreError, StoreEvent, StoreEventKind};
use arena_actor::{reply, Handler, Response, WeakMailbox};
use async_trait::async_trait;
use registry::ConnectWaiter;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Collaborators injected when the actor starts.
pub struct OrchestratorContext {
    pub fleet: Arc<dyn Fleet>,
    pub mailbox: WeakMailbox<SessionEvent>,
}

type FollowUps = Arc<Mutex<VecDeque<StoreEvent>>>;

#[derive(Debug)]
pub struct Orchestrator {
    config: ArenaConfig,
    store: SessionStore,
    controllers: ControllerRegistry,
    orbs: OrbRegistry,
    follow_ups: FollowUps,
}

impl Orchestrator {
    pub fn new(config: ArenaConfig) -> Self {
        let mut store = SessionStore::new(config.command_budget);
        let follow_ups = FollowUps::default();
        for kind in StoreEventKind::ALL {
            let queue = follow_ups.clone();
            store.subscribe(kind, move |event| {
                queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(event.clone());
            });
        }

        Self {
            config,
            store,
            controllers: ControllerRegistry::default(),
            orbs: OrbRegistry::default(),
            follow_ups,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    fn next_follow_up(&self) -> Option<StoreEvent> {
        self.follow_ups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    // --- store reactions ---

    async fn on_store_event(&mut self, event: StoreEvent, ctx: &OrchestratorContext) {
        match event {
            StoreEvent::GamePhaseChanged(game_state) => {
                self.controllers
                    .broadcast(&ControllerMessage::GameState { game_state });
            }
            StoreEvent::CommandBudgetChanged(count) => {
                self.controllers
                    .broadcast(&ControllerMessage::AvailableCommandsCount { count });
            }
            StoreEvent::LinkRequested { key, orb } => self.apply_link(key, orb),
            StoreEvent::AddOrbRequested { name, port } => self.begin_add(name, port, None, ctx),
            StoreEvent::RemoveOrbRequested { name } => {
                if let Err(e) = self.remove_orb(name.clone(), ctx) {
                    warn!(orb = %name, error = %e, "Remove orb failed");
                }
            }
            StoreEvent::OniRequested { key, enabled } => self.set_oni(key, enabled),
            StoreEvent::BatteryCheckRequested => self.check_batteries(ctx),
        }
    }

    fn apply_link(&mut self, key: ControllerKey, orb: Option<OrbName>) {
        let orb_known = orb.as_ref().map_or(true, |name| self.orbs.contains(name));
        let Some(session) = self.controllers.get_mut(&key) else {
            debug!(%key, "Link for unknown controller dropped");
            return;
        };
        match orb {
            None => session.unlink(),
            Some(name) if orb_known => session.link(name),
            Some(name) => {
                debug!(%key, orb = %name, "Link to unresolved orb dropped");
                return;
            }
        }
        self.refresh_link_status();
    }

    fn set_oni(&mut self, key: ControllerKey, enabled: bool) {
        let Some(session) = self.controllers.get_mut(&key) else {
            warn!(%key, "Oni toggle for unknown controller dropped");
            return;
        };
        session.is_oni = enabled;
        info!(%key, enabled, "Oni set");
        session.push(ControllerMessage::Oni(enabled));
    }

    fn check_batteries(&self, ctx: &OrchestratorContext) {
        for (name, entry) in self.orbs.iter() {
            let name = name.clone();
            let handle = entry.handle.clone();
            let mailbox = ctx.mailbox.clone();
            tokio::spawn(async move {
                match handle.battery().await {
                    Ok(level) => {
                        let _ = mailbox.send(SessionEvent::Battery { name, level });
                    }
                    Err(e) => warn!(orb = %name, error = %e, "Battery query failed"),
                }
            });
        }
    }

    // --- controllers ---

    fn connect_controller(
        &mut self,
        key: ControllerKey,
        channel: ControllerChannel,
        mut commands: CommandStream,
        ctx: &OrchestratorContext,
    ) -> Result<(), ArenaError> {
        if self.controllers.contains(&key) {
            return Err(ArenaError::DuplicateController(key));
        }

        let forward_key = key.clone();
        let mailbox = ctx.mailbox.clone();
        let command_task = tokio::spawn(async move {
            while let Some(intent) = commands.recv().await {
                let event = SessionEvent::Command {
                    key: forward_key.clone(),
                    intent,
                };
                if mailbox.send(event).is_err() {
                    break;
                }
            }
        });

        let outbox = spawn_outbox(key.clone(), self.config.command_timeout());
        let session = ControllerSession::new(
            key.clone(),
            self.config.initial_hp,
            channel,
            command_task,
            outbox,
        );
        let greeting = [
            ControllerMessage::GameState {
                game_state: self.store.game_phase(),
            },
            ControllerMessage::AvailableCommandsCount {
                count: self.store.command_budget(),
            },
            ControllerMessage::Oni(session.is_oni),
            ControllerMessage::Hp { hp: session.hp },
            ControllerMessage::ClientKey(key.clone()),
        ];

        self.controllers.insert(session);
        self.store.register_controller(key.clone());
        if let Some(session) = self.controllers.get(&key) {
            for message in greeting {
                session.push(message);
            }
        }
        info!(%key, "Controller connected");
        Ok(())
    }

    fn disconnect_controller(&mut self, key: ControllerKey) {
        if self.controllers.remove(&key).is_none() {
            debug!(%key, "Disconnect for unknown controller");
            return;
        }
        self.store.deregister_controller(&key);
        self.refresh_link_status();
        info!(%key, "Controller disconnected");
    }

    /// The controller linked or unlinked itself.
    fn controller_link_changed(&mut self, key: ControllerKey, orb: Option<OrbName>) {
        if let Some(name) = &orb {
            if !self.orbs.contains(name) {
                debug!(%key, orb = %name, "Link change to unresolved orb dropped");
                return;
            }
        }
        let Some(session) = self.controllers.get_mut(&key) else {
            debug!(%key, "Link change for unknown controller dropped");
            return;
        };
        session.linked_orb = orb;
        self.refresh_link_status();
    }

    fn dispatch_command(
        &self,
        key: &ControllerKey,
        intent: CommandIntent,
    ) -> Result<(), ArenaError> {
        let session = self
            .controllers
            .get(key)
            .ok_or_else(|| ArenaError::UnknownController(key.clone()))?;
        let Some(orb) = session.linked_orb.clone() else {
            debug!(%key, command = %intent.name, "No linked orb, command dropped");
            return Ok(());
        };
        let handle = self
            .orbs
            .get(&orb)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| FleetError::NotFound(orb.clone()))?;

        if !handle.supports(&intent.name) {
            return Err(ArenaError::UnsupportedCommand {
                orb,
                command: intent.name,
            });
        }

        if !session.enqueue(handle, intent) {
            debug!(%key, "Command outbox closed");
        }
        Ok(())
    }

    // --- orbs ---

    fn register_orb(&mut self, orb: &SharedOrb) -> Result<(), StoreError> {
        self.store
            .register_orb(OrbSummary::new(orb.name().clone(), orb.port()))?;
        let armed = self.config.detect_collisions;
        if armed {
            orb.detect_collisions();
        }
        self.orbs.insert(orb.clone(), armed);
        self.refresh_link_status();
        Ok(())
    }

    fn begin_add(
        &mut self,
        name: OrbName,
        port: String,
        waiter: Option<ConnectWaiter>,
        ctx: &OrchestratorContext,
    ) {
        let rejection = if self.store.orbs().contains(&name) {
            Some(ArenaError::Store(StoreError::DuplicateOrb(name.clone())))
        } else if self.orbs.is_pending(&name) {
            Some(ArenaError::ConnectPending(name.clone()))
        } else {
            None
        };
        if let Some(error) = rejection {
            warn!(orb = %name, %error, "Add orb rejected");
            self.store.report_connect_failure(name, error.to_string());
            if let Some(waiter) = waiter {
                reply(waiter, Err(error));
            }
            return;
        }

        let request = self.orbs.begin_connect(name.clone(), port.clone(), waiter);
        info!(orb = %name, %port, request, "Connecting orb");

        let fleet = ctx.fleet.clone();
        let mailbox = ctx.mailbox.clone();
        tokio::spawn(async move {
            let result = fleet.materialize(&name, &port).await;
            let orb = result.as_ref().ok().cloned();
            let delivered = mailbox
                .send(SessionEvent::OrbMaterialized {
                    name,
                    request,
                    result,
                })
                .is_ok();
            if !delivered {
                if let Some(orb) = orb {
                    fleet.teardown(orb).await;
                }
            }
        });
    }

    fn orb_materialized(
        &mut self,
        name: OrbName,
        request: u64,
        result: Result<SharedOrb, FleetError>,
        ctx: &OrchestratorContext,
    ) {
        let Some(pending) = self.orbs.finish_connect(&name, request) else {
            debug!(orb = %name, request, "Discarding stale connect");
            if let Ok(orb) = result {
                spawn_teardown(orb, ctx);
            }
            return;
        };

        let outcome = match result {
            Ok(orb) => self.register_orb(&orb).map_err(|e| {
                spawn_teardown(orb, ctx);
                ArenaError::from(e)
            }),
            Err(e) => Err(ArenaError::from(e)),
        };
        if let Err(error) = &outcome {
            warn!(orb = %name, %error, "Orb connect failed");
            self.store.report_connect_failure(name, error.to_string());
        }
        if let Some(waiter) = pending.waiter {
            reply(waiter, outcome);
        }
    }

    /// Cancels a pending connect, unlinks every controller on the orb and
    /// tears it down.
    fn remove_orb(&mut self, name: OrbName, ctx: &OrchestratorContext) -> Result<(), ArenaError> {
        let cancelled = self.orbs.cancel_connect(&name);
        let was_pending = cancelled.is_some();
        if let Some(waiter) = cancelled.and_then(|pending| pending.waiter) {
            reply(waiter, Err(ArenaError::ConnectCancelled(name.clone())));
        }

        let Some(entry) = self.orbs.remove(&name) else {
            if was_pending {
                info!(orb = %name, "Pending connect cancelled");
                return Ok(());
            }
            return Err(StoreError::UnknownOrb(name).into());
        };

        for session in self.controllers.linked_to(&name) {
            session.unlink();
        }
        spawn_teardown(entry.handle, ctx);
        self.store.deregister_orb(&name)?;
        self.refresh_link_status();
        Ok(())
    }

    async fn orb_added(&mut self, name: OrbName, ctx: &OrchestratorContext) {
        let Some(orb) = ctx.fleet.resolve(&name).await else {
            warn!(orb = %name, "Added orb not found in fleet");
            return;
        };
        if let Err(e) = self.register_orb(&orb) {
            warn!(orb = %name, error = %e, "Added orb not registered");
        }
    }

    fn collision(&mut self, name: &OrbName) {
        match self.orbs.get(name) {
            Some(entry) if entry.collisions_armed => {}
            Some(_) => {
                debug!(orb = %name, "Collision on unarmed orb ignored");
                return;
            }
            None => {
                debug!(orb = %name, "Collision on unknown orb ignored");
                return;
            }
        }

        let phase = self.store.game_phase();
        let damage = self.config.collision_damage;
        for session in self.controllers.linked_to(name) {
            if let Some(hp) = rules::collision_outcome(phase, session.is_oni, session.hp, damage) {
                session.hp = hp;
                debug!(key = %session.key, orb = %name, hp, "Collision damage");
                session.push(ControllerMessage::Hp { hp });
            }
        }
    }

    fn battery(&mut self, name: &OrbName, level: BatteryLevel) {
        if let Err(e) = self.store.update_battery(name, level) {
            warn!(orb = %name, error = %e, "Battery update dropped");
        }
    }

    /// Mirrors controller links into the roster's link column.
    fn refresh_link_status(&mut self) {
        let linked = self.controllers.linked_orbs();
        let unlinked: HashSet<OrbName> = self
            .store
            .orbs()
            .names()
            .filter(|name| !linked.contains(*name))
            .cloned()
            .collect();
        self.store.recompute_link_status(&unlinked);
    }

    // --- operator ---

    fn connect_operator(
        &mut self,
        channel: OperatorChannel,
        respond_to: Response<Result<OperatorId, ArenaError>>,
    ) {
        reply(
            respond_to,
            self.store.connect_operator(channel).map_err(ArenaError::from),
        );
    }
}

/// Sends a controller's commands one at a time, each bounded by `timeout`.
fn spawn_outbox(key: ControllerKey, timeout: Duration) -> CommandOutbox {
    let (outbox, mut queue) = mpsc::unbounded_channel::<OrbCommand>();
    tokio::spawn(async move {
        while let Some(OrbCommand { orb, intent }) = queue.recv().await {
            let outcome =
                tokio::time::timeout(timeout, orb.send(&intent.name, &intent.args)).await;
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => ArenaError::from(e),
                Err(_) => ArenaError::CommandTimeout {
                    orb: orb.name().clone(),
                    command: intent.name.clone(),
                },
            };
            warn!(%key, command = %intent.name, %error, "Command failed");
        }
    });
    outbox
}

fn spawn_teardown(orb: SharedOrb, ctx: &OrchestratorContext) {
    let fleet = ctx.fleet.clone();
    tokio::spawn(async move {
        let name = orb.name().clone();
        fleet.teardown(orb).await;
        debug!(orb = %name, "Orb torn down");
    });
}

#[async_trait]
impl Handler for Orchestrator {
    type Message = SessionEvent;
    type Context = OrchestratorContext;

    /// Registers the orbs the fleet already holds.
    async fn on_start(&mut self, ctx: &OrchestratorContext) {
        let discovered: BTreeSet<OrbName> =
            ctx.fleet.enumerate_unlinked_orbs().await.into_iter().collect();
        for name in discovered {
            self.orb_added(name, ctx).await;
        }
        self.refresh_link_status();
        info!(orbs = self.store.orbs().len(), "Discovery finished");
    }

    async fn handle(&mut self, message: SessionEvent, ctx: &OrchestratorContext) {
        match message {
            SessionEvent::OperatorConnected {
                channel,
                respond_to,
            } => self.connect_operator(channel, respond_to),
            SessionEvent::OperatorDisconnected { id } => {
                self.store.disconnect_operator(id);
            }
            SessionEvent::OperatorRequest { id, request } => {
                if self.store.operator_id() == Some(id) {
                    self.store.apply(request);
                } else {
                    warn!(operator = id, ?request, "Request from non-current operator dropped");
                }
            }
            SessionEvent::ControllerConnected {
                key,
                channel,
                commands,
                respond_to,
            } => {
                let result = self.connect_controller(key.clone(), channel, commands, ctx);
                if let Err(error) = &result {
                    warn!(%key, %error, "Controller rejected");
                }
                reply(respond_to, result);
            }
            SessionEvent::ControllerDisconnected { key } => self.disconnect_controller(key),
            SessionEvent::ControllerLinkChanged { key, orb } => {
                self.controller_link_changed(key, orb)
            }
            SessionEvent::Command { key, intent } => {
                let command = intent.name.clone();
                if let Err(error) = self.dispatch_command(&key, intent) {
                    warn!(%key, %command, %error, "Command dropped");
                }
            }
            SessionEvent::OrbAdded { name } => self.orb_added(name, ctx).await,
            SessionEvent::OrbMaterialized {
                name,
                request,
                result,
            } => self.orb_materialized(name, request, result, ctx),
            SessionEvent::Collision { name } => self.collision(&name),
            SessionEvent::Battery { name, level } => self.battery(&name, level),
            SessionEvent::AddOrb {
                name,
                port,
                respond_to,
            } => self.begin_add(name, port, Some(respond_to), ctx),
            SessionEvent::RemoveOrb { name, respond_to } => {
                let result = self.remove_orb(name, ctx);
                reply(respond_to, result);
            }
            SessionEvent::Snapshot { respond_to } => reply(respond_to, self.store.snapshot()),
            SessionEvent::ControllerStatus { key, respond_to } => {
                reply(respond_to, self.controllers.get(&key).map(ControllerSession::status));
            }
        }

        while let Some(event) = self.next_follow_up() {
            self.on_store_event(event, ctx).await;
        }
    }

    async fn on_stop(&mut self, ctx: &OrchestratorContext) {
        let names: Vec<OrbName> = self.orbs.iter().map(|(name, _)| name.clone()).collect();
        for name in names {
            if let Some(entry) = self.orbs.remove(&name) {
                ctx.fleet.teardown(entry.handle).await;
            }
        }
        info!(
            controllers = self.controllers.len(),
            orbs = self.store.orbs().len(),
            "Session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::command_stream;
    use crate::fleet::VirtualFleet;
    use arena_actor::Actor;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(receiver: &mut UnboundedReceiver<ControllerMessage>) -> Vec<ControllerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    async fn connect(
        mailbox: &arena_actor::Mailbox<SessionEvent>,
        key: &str,
    ) -> UnboundedReceiver<ControllerMessage> {
        let (channel, receiver) = ControllerChannel::open();
        let (_commands, stream) = command_stream();
        mailbox
            .request(|respond_to| SessionEvent::ControllerConnected {
                key: key.into(),
                channel,
                commands: stream,
                respond_to,
            })
            .await
            .unwrap()
            .unwrap();
        receiver
    }

    #[tokio::test]
    async fn test_greeting_order() {
        let fleet: Arc<dyn Fleet> = Arc::new(VirtualFleet::new());
        let (actor, mailbox) = Actor::new(Orchestrator::new(ArenaConfig::default()));
        let ctx = OrchestratorContext {
            fleet,
            mailbox: mailbox.downgrade(),
        };
        let task = tokio::spawn(actor.run(ctx));

        let mut rx = connect(&mailbox, "c-1").await;
        assert_eq!(
            drain(&mut rx),
            vec![
                ControllerMessage::GameState {
                    game_state: crate::model::GamePhase::Inactive
                },
                ControllerMessage::AvailableCommandsCount {
                    count: crate::model::CommandBudget::default()
                },
                ControllerMessage::Oni(false),
                ControllerMessage::Hp { hp: 100 },
                ControllerMessage::ClientKey("c-1".into()),
            ]
        );

        drop(mailbox);
        let orchestrator = task.await.unwrap();
        assert_eq!(orchestrator.controllers().len(), 1);
        assert!(orchestrator.store().links().contains(&"c-1".into()));
    }

    #[tokio::test]
    async fn test_link_then_unlink_sends_one_unlink() {
        let fleet: Arc<dyn Fleet> = Arc::new(VirtualFleet::new().with_orb("A", "1000"));
        let (actor, mailbox) = Actor::new(Orchestrator::new(ArenaConfig::default()));
        let ctx = OrchestratorContext {
            fleet,
            mailbox: mailbox.downgrade(),
        };
        let task = tokio::spawn(actor.run(ctx));

        let (operator, _operator_rx) = OperatorChannel::open();
        let id = mailbox
            .request(|respond_to| SessionEvent::OperatorConnected {
                channel: operator,
                respond_to,
            })
            .await
            .unwrap()
            .unwrap();
        let mut rx = connect(&mailbox, "c-1").await;
        drain(&mut rx);

        for orb in [Some("A".into()), None] {
            mailbox
                .send(SessionEvent::OperatorRequest {
                    id,
                    request: crate::channels::OperatorRequest::Link {
                        key: "c-1".into(),
                        orb,
                    },
                })
                .unwrap();
        }
        let snapshot = mailbox
            .request(|respond_to| SessionEvent::Snapshot { respond_to })
            .await
            .unwrap();

        let messages = drain(&mut rx);
        assert_eq!(
            messages,
            vec![
                ControllerMessage::Link("A".into()),
                ControllerMessage::Unlink
            ]
        );
        assert_eq!(snapshot.links.get(&"c-1".into()), Some(None));

        drop(mailbox);
        task.await.unwrap();
    }
}
