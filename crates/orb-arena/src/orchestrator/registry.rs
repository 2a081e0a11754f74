//! Runtime records owned by the orchestrator: one per connected controller
//! and one per registered orb, plus the connects still in flight.

use super::error::ArenaError;
use crate::channels::{CommandIntent, ControllerChannel, ControllerMessage};
use crate::fleet::SharedOrb;
use crate::model::{ControllerKey, OrbName};
use arena_actor::Response;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A checked command on its way to the orb it was checked against.
#[derive(Debug)]
pub struct OrbCommand {
    pub orb: SharedOrb,
    pub intent: CommandIntent,
}

/// Per-controller queue drained by a task that talks to the fleet, so a slow
/// driver only delays its own controller's commands.
pub type CommandOutbox = mpsc::UnboundedSender<OrbCommand>;

#[derive(Debug)]
pub struct ControllerSession {
    pub key: ControllerKey,
    pub hp: i32,
    pub is_oni: bool,
    pub linked_orb: Option<OrbName>,
    channel: ControllerChannel,
    command_task: JoinHandle<()>,
    outbox: CommandOutbox,
}

/// Read-only view of a controller session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub key: ControllerKey,
    pub hp: i32,
    pub is_oni: bool,
    pub linked_orb: Option<OrbName>,
}

impl ControllerSession {
    pub fn new(
        key: ControllerKey,
        hp: i32,
        channel: ControllerChannel,
        command_task: JoinHandle<()>,
        outbox: CommandOutbox,
    ) -> Self {
        Self {
            key,
            hp,
            is_oni: false,
            linked_orb: None,
            channel,
            command_task,
            outbox,
        }
    }

    /// A controller that went away is cleaned up by its disconnect event, so
    /// a failed push is only logged.
    pub fn push(&self, message: ControllerMessage) {
        if self.channel.push(message).is_err() {
            debug!(key = %self.key, "Controller channel closed");
        }
    }

    pub fn link(&mut self, orb: OrbName) {
        self.linked_orb = Some(orb.clone());
        if self.channel.link(orb).is_err() {
            debug!(key = %self.key, "Controller channel closed");
        }
    }

    pub fn unlink(&mut self) {
        self.linked_orb = None;
        if self.channel.unlink().is_err() {
            debug!(key = %self.key, "Controller channel closed");
        }
    }

    /// Queues a command for the outbox task. Returns `false` once that task
    /// has stopped.
    pub fn enqueue(&self, orb: SharedOrb, intent: CommandIntent) -> bool {
        self.outbox.send(OrbCommand { orb, intent }).is_ok()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            key: self.key.clone(),
            hp: self.hp,
            is_oni: self.is_oni,
            linked_orb: self.linked_orb.clone(),
        }
    }
}

impl Drop for ControllerSession {
    fn drop(&mut self) {
        self.command_task.abort();
    }
}

#[derive(Debug, Default)]
pub struct ControllerRegistry {
    sessions: BTreeMap<ControllerKey, ControllerSession>,
}

impl ControllerRegistry {
    pub fn contains(&self, key: &ControllerKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Returns `false`, dropping `session`, if the key is taken.
    pub fn insert(&mut self, session: ControllerSession) -> bool {
        if self.contains(&session.key) {
            return false;
        }
        self.sessions.insert(session.key.clone(), session);
        true
    }

    pub fn remove(&mut self, key: &ControllerKey) -> Option<ControllerSession> {
        self.sessions.remove(key)
    }

    pub fn get(&self, key: &ControllerKey) -> Option<&ControllerSession> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &ControllerKey) -> Option<&mut ControllerSession> {
        self.sessions.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerSession> {
        self.sessions.values()
    }

    pub fn linked_to<'a>(
        &'a mut self,
        orb: &'a OrbName,
    ) -> impl Iterator<Item = &'a mut ControllerSession> + 'a {
        self.sessions
            .values_mut()
            .filter(move |session| session.linked_orb.as_ref() == Some(orb))
    }

    /// Orbs driven by at least one controller.
    pub fn linked_orbs(&self) -> HashSet<OrbName> {
        self.sessions
            .values()
            .filter_map(|session| session.linked_orb.clone())
            .collect()
    }

    pub fn broadcast(&self, message: &ControllerMessage) {
        for session in self.sessions.values() {
            session.push(message.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct OrbEntry {
    pub handle: SharedOrb,
    pub collisions_armed: bool,
}

pub type ConnectWaiter = Response<Result<(), ArenaError>>;

/// A materialize request that has not come back yet.
#[derive(Debug)]
pub struct PendingConnect {
    pub request: u64,
    pub port: String,
    /// Set when a direct API caller awaits the outcome.
    pub waiter: Option<ConnectWaiter>,
}

#[derive(Debug, Default)]
pub struct OrbRegistry {
    orbs: BTreeMap<OrbName, OrbEntry>,
    pending: HashMap<OrbName, PendingConnect>,
    next_request: u64,
}

impl OrbRegistry {
    pub fn insert(&mut self, handle: SharedOrb, collisions_armed: bool) -> bool {
        let name = handle.name().clone();
        if self.orbs.contains_key(&name) {
            return false;
        }
        self.orbs.insert(
            name,
            OrbEntry {
                handle,
                collisions_armed,
            },
        );
        true
    }

    pub fn remove(&mut self, name: &OrbName) -> Option<OrbEntry> {
        self.orbs.remove(name)
    }

    pub fn get(&self, name: &OrbName) -> Option<&OrbEntry> {
        self.orbs.get(name)
    }

    pub fn contains(&self, name: &OrbName) -> bool {
        self.orbs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OrbName, &OrbEntry)> {
        self.orbs.iter()
    }

    pub fn is_pending(&self, name: &OrbName) -> bool {
        self.pending.contains_key(name)
    }

    /// Records a connect in flight and returns its request id.
    pub fn begin_connect(
        &mut self,
        name: OrbName,
        port: String,
        waiter: Option<ConnectWaiter>,
    ) -> u64 {
        self.next_request += 1;
        let request = self.next_request;
        self.pending.insert(
            name,
            PendingConnect {
                request,
                port,
                waiter,
            },
        );
        request
    }

    /// Claims the pending entry iff `request` is still the current one for
    /// `name`. A `None` means the completion is stale.
    pub fn finish_connect(&mut self, name: &OrbName, request: u64) -> Option<PendingConnect> {
        match self.pending.get(name) {
            Some(pending) if pending.request == request => self.pending.remove(name),
            _ => None,
        }
    }

    pub fn cancel_connect(&mut self, name: &OrbName) -> Option<PendingConnect> {
        self.pending.remove(name)
    }
}
