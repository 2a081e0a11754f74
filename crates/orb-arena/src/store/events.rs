//! Typed notifications raised by the store.

use crate::model::{CommandBudget, ControllerKey, GamePhase, OrbName};
use std::collections::HashMap;
use std::fmt;

/// Something the store changed, or an intent it forwards without acting on.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    GamePhaseChanged(GamePhase),
    CommandBudgetChanged(CommandBudget),
    LinkRequested {
        key: ControllerKey,
        orb: Option<OrbName>,
    },
    AddOrbRequested {
        name: OrbName,
        port: String,
    },
    RemoveOrbRequested {
        name: OrbName,
    },
    OniRequested {
        key: ControllerKey,
        enabled: bool,
    },
    BatteryCheckRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEventKind {
    GamePhaseChanged,
    CommandBudgetChanged,
    LinkRequested,
    AddOrbRequested,
    RemoveOrbRequested,
    OniRequested,
    BatteryCheckRequested,
}

impl StoreEventKind {
    pub const ALL: [StoreEventKind; 7] = [
        StoreEventKind::GamePhaseChanged,
        StoreEventKind::CommandBudgetChanged,
        StoreEventKind::LinkRequested,
        StoreEventKind::AddOrbRequested,
        StoreEventKind::RemoveOrbRequested,
        StoreEventKind::OniRequested,
        StoreEventKind::BatteryCheckRequested,
    ];
}

impl StoreEvent {
    pub fn kind(&self) -> StoreEventKind {
        match self {
            StoreEvent::GamePhaseChanged(_) => StoreEventKind::GamePhaseChanged,
            StoreEvent::CommandBudgetChanged(_) => StoreEventKind::CommandBudgetChanged,
            StoreEvent::LinkRequested { .. } => StoreEventKind::LinkRequested,
            StoreEvent::AddOrbRequested { .. } => StoreEventKind::AddOrbRequested,
            StoreEvent::RemoveOrbRequested { .. } => StoreEventKind::RemoveOrbRequested,
            StoreEvent::OniRequested { .. } => StoreEventKind::OniRequested,
            StoreEvent::BatteryCheckRequested => StoreEventKind::BatteryCheckRequested,
        }
    }
}

pub type StoreHandler = Box<dyn FnMut(&StoreEvent) + Send + Sync>;

/// Handlers per event kind, called in subscription order.
#[derive(Default)]
pub struct Subscribers {
    handlers: HashMap<StoreEventKind, Vec<StoreHandler>>,
}

impl Subscribers {
    pub fn subscribe(&mut self, kind: StoreEventKind, handler: StoreHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Returns how many handlers saw the event.
    pub fn emit(&mut self, event: &StoreEvent) -> usize {
        match self.handlers.get_mut(&event.kind()) {
            Some(handlers) => {
                for handler in handlers.iter_mut() {
                    handler(event);
                }
                handlers.len()
            }
            None => 0,
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (kind, handlers.len()))
            .collect();
        f.debug_struct("Subscribers").field("handlers", &counts).finish()
    }
}
