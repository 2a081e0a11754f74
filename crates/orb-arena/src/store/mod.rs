//! # Session State Store
//!
//! The canonical session record: game phase, command budget, link table and
//! orb roster, plus the single operator connection slot.
//!
//! ## Responsibilities
//!
//! - Validates operator edits and ignores out-of-domain values.
//! - Pushes incremental updates to the operator when one is connected. Nothing
//!   is queued while the slot is empty; a newcomer gets a full `defaultData`.
//! - Raises typed [`StoreEvent`]s for subscribers. The store never applies a
//!   game rule itself: add/remove/oni/battery intents are only forwarded.
//!
//! The store is a plain struct owned by the orchestrator actor, so every call
//! runs on that actor's task and needs no locking.
//!
//! ```rust
//! use orb_arena::model::{CommandBudget, OrbSummary};
//! use orb_arena::store::{SessionStore, StoreEvent, StoreEventKind};
//! use std::sync::{Arc, Mutex};
//!
//! let mut store = SessionStore::new(CommandBudget::default());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! store.subscribe(StoreEventKind::GamePhaseChanged, move |event| {
//!     sink.lock().unwrap().push(event.clone());
//! });
//!
//! assert!(!store.set_game_phase("paused"));
//! assert!(store.set_game_phase("active"));
//! store.register_orb(OrbSummary::new("alpha", "/dev/rfcomm0")).unwrap();
//!
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! assert_eq!(store.snapshot().orbs.len(), 1);
//! ```

mod error;
mod events;

pub use error::StoreError;
pub use events::{StoreEvent, StoreEventKind, StoreHandler, Subscribers};

use crate::channels::{OperatorChannel, OperatorId, OperatorPush, OperatorRequest};
use crate::model::{
    BatteryLevel, CommandBudget, ControllerKey, GamePhase, LinkTable, OrbName, OrbRoster,
    OrbSummary, SessionSnapshot,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct SessionStore {
    game_phase: GamePhase,
    command_budget: CommandBudget,
    links: LinkTable,
    orbs: OrbRoster,
    operator: Option<OperatorChannel>,
    subscribers: Subscribers,
}

impl SessionStore {
    pub fn new(command_budget: CommandBudget) -> Self {
        Self {
            game_phase: GamePhase::default(),
            command_budget,
            links: LinkTable::new(),
            orbs: OrbRoster::new(),
            operator: None,
            subscribers: Subscribers::default(),
        }
    }

    pub fn subscribe<F>(&mut self, kind: StoreEventKind, handler: F)
    where
        F: FnMut(&StoreEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(kind, Box::new(handler));
    }

    // --- operator slot ---

    /// Takes the operator slot and sends the full snapshot. A second
    /// operator is turned away and its channel closed; the first one keeps
    /// the slot.
    pub fn connect_operator(&mut self, channel: OperatorChannel) -> Result<OperatorId, StoreError> {
        let id = channel.id();
        if let Some(current) = &self.operator {
            warn!(operator = id, current = current.id(), "Operator rejected: slot taken");
            channel.close();
            return Err(StoreError::ConnectionRejected { id });
        }

        info!(operator = id, "Operator connected");
        self.operator = Some(channel);
        self.push(OperatorPush::DefaultData(self.snapshot()));
        Ok(id)
    }

    /// Frees the slot if `id` holds it. Returns whether it did.
    pub fn disconnect_operator(&mut self, id: OperatorId) -> bool {
        if self.operator_id() != Some(id) {
            debug!(operator = id, "Ignoring disconnect of non-current operator");
            return false;
        }
        self.operator = None;
        info!(operator = id, "Operator disconnected");
        true
    }

    pub fn operator_id(&self) -> Option<OperatorId> {
        self.operator.as_ref().map(OperatorChannel::id)
    }

    // --- operator edits ---

    /// Dispatches a decoded operator request.
    pub fn apply(&mut self, request: OperatorRequest) {
        match request {
            OperatorRequest::GameState(phase) => {
                self.set_game_phase(&phase);
            }
            OperatorRequest::AvailableCommandsCount(count) => {
                self.set_command_budget(count);
            }
            OperatorRequest::Link { key, orb } => self.set_link(key, orb),
            OperatorRequest::AddOrb { name, port } => self.request_add_orb(name, port),
            OperatorRequest::RemoveOrb { name } => self.request_remove_orb(name),
            OperatorRequest::Oni { key, enabled } => self.request_oni(key, enabled),
            OperatorRequest::CheckBattery => self.request_battery_check(),
        }
    }

    /// Returns `false` when `phase` is not an exact phase name.
    pub fn set_game_phase(&mut self, phase: &str) -> bool {
        match phase.parse::<GamePhase>() {
            Ok(phase) => {
                self.game_phase = phase;
                info!(%phase, "Game phase set");
                self.emit(StoreEvent::GamePhaseChanged(phase));
                true
            }
            Err(e) => {
                debug!(error = %e, "Ignoring game phase");
                false
            }
        }
    }

    pub fn set_command_budget(&mut self, count: i64) -> bool {
        match CommandBudget::new(count) {
            Ok(budget) => {
                self.command_budget = budget;
                info!(%budget, "Command budget set");
                self.emit(StoreEvent::CommandBudgetChanged(budget));
                true
            }
            Err(e) => {
                debug!(error = %e, "Ignoring command budget");
                false
            }
        }
    }

    /// Records the requested link. `orb` is not checked against the roster.
    pub fn set_link(&mut self, key: ControllerKey, orb: Option<OrbName>) {
        if !self.links.set(&key, orb.clone()) {
            warn!(%key, "Link request for unknown controller dropped");
            return;
        }
        debug!(%key, ?orb, "Link requested");
        self.emit(StoreEvent::LinkRequested { key, orb });
    }

    pub fn request_add_orb(&mut self, name: OrbName, port: String) {
        self.emit(StoreEvent::AddOrbRequested { name, port });
    }

    pub fn request_remove_orb(&mut self, name: OrbName) {
        self.emit(StoreEvent::RemoveOrbRequested { name });
    }

    pub fn request_oni(&mut self, key: ControllerKey, enabled: bool) {
        self.emit(StoreEvent::OniRequested { key, enabled });
    }

    pub fn request_battery_check(&mut self) {
        self.emit(StoreEvent::BatteryCheckRequested);
    }

    // --- mirrored runtime state ---

    pub fn register_controller(&mut self, key: ControllerKey) -> bool {
        if !self.links.insert_unlinked(key.clone()) {
            return false;
        }
        self.push(OperatorPush::AddController(key));
        true
    }

    pub fn deregister_controller(&mut self, key: &ControllerKey) -> bool {
        if !self.links.remove(key) {
            return false;
        }
        self.push(OperatorPush::RemoveController(key.clone()));
        true
    }

    pub fn register_orb(&mut self, summary: OrbSummary) -> Result<(), StoreError> {
        let name = summary.name.clone();
        if !self.orbs.insert(summary) {
            return Err(StoreError::DuplicateOrb(name));
        }
        info!(orb = %name, "Orb registered");
        self.push_roster();
        Ok(())
    }

    pub fn deregister_orb(&mut self, name: &OrbName) -> Result<OrbSummary, StoreError> {
        let removed = self
            .orbs
            .remove(name)
            .ok_or_else(|| StoreError::UnknownOrb(name.clone()))?;
        let unlinked = self.links.clear_orb(name);
        info!(orb = %name, unlinked, "Orb deregistered");
        self.push_roster();
        Ok(removed)
    }

    pub fn update_battery(&mut self, name: &OrbName, level: BatteryLevel) -> Result<(), StoreError> {
        let orb = self
            .orbs
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownOrb(name.clone()))?;
        orb.battery = Some(level);
        self.push_roster();
        Ok(())
    }

    /// Orbs named in `unlinked` become unlinked, every other orb linked.
    pub fn recompute_link_status(&mut self, unlinked: &HashSet<OrbName>) {
        self.orbs.apply_unlinked(unlinked);
        self.push_roster();
    }

    pub fn report_connect_failure(&mut self, name: OrbName, reason: String) {
        self.push(OperatorPush::OrbConnectFailed { name, reason });
    }

    // --- reads ---

    pub fn game_phase(&self) -> GamePhase {
        self.game_phase
    }

    pub fn command_budget(&self) -> CommandBudget {
        self.command_budget
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn orbs(&self) -> &OrbRoster {
        &self.orbs
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_phase: self.game_phase,
            command_budget: self.command_budget,
            links: self.links.clone(),
            orbs: self.orbs.clone(),
        }
    }

    fn push_roster(&mut self) {
        if self.operator.is_some() {
            self.push(OperatorPush::UpdateOrbs(self.orbs.clone()));
        }
    }

    fn push(&mut self, message: OperatorPush) {
        let Some(operator) = &self.operator else {
            return;
        };
        if operator.push(message).is_err() {
            warn!(operator = operator.id(), "Operator went away, freeing slot");
            self.operator = None;
        }
    }

    fn emit(&mut self, event: StoreEvent) {
        let handled = self.subscribers.emit(&event);
        debug!(?event, handled, "Store event");
    }
}
