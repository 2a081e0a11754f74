//! In-memory fleet for demos and tests.

use super::{Fleet, FleetError, OrbHandle, SharedOrb};
use crate::model::{BatteryLevel, OrbName};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_COMMANDS: &[&str] = &["roll", "stop", "color", "setHeading"];
pub const DEFAULT_BATTERY: &str = "Battery OK";

#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub command: String,
    pub args: Vec<Value>,
}

#[derive(Debug)]
pub struct VirtualOrb {
    name: OrbName,
    port: String,
    commands: HashSet<String>,
    collisions_armed: AtomicBool,
    battery: Mutex<BatteryLevel>,
    sent: Mutex<Vec<SentCommand>>,
}

impl VirtualOrb {
    fn new(name: OrbName, port: String, commands: HashSet<String>) -> Self {
        Self {
            name,
            port,
            commands,
            collisions_armed: AtomicBool::new(false),
            battery: Mutex::new(BatteryLevel::new(DEFAULT_BATTERY)),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn collisions_armed(&self) -> bool {
        self.collisions_armed.load(Ordering::SeqCst)
    }

    pub async fn set_battery(&self, level: impl Into<String>) {
        *self.battery.lock().await = BatteryLevel::new(level);
    }

    pub async fn sent_commands(&self) -> Vec<SentCommand> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl OrbHandle for VirtualOrb {
    fn name(&self) -> &OrbName {
        &self.name
    }

    fn port(&self) -> &str {
        &self.port
    }

    fn supports(&self, command: &str) -> bool {
        self.commands.contains(command)
    }

    async fn send(&self, command: &str, args: &[Value]) -> Result<(), FleetError> {
        if !self.supports(command) {
            return Err(FleetError::CommandFailed {
                name: self.name.clone(),
                command: command.to_string(),
                reason: "unknown command".into(),
            });
        }
        debug!(orb = %self.name, command, ?args, "Virtual command");
        self.sent.lock().await.push(SentCommand {
            command: command.to_string(),
            args: args.to_vec(),
        });
        Ok(())
    }

    fn detect_collisions(&self) {
        self.collisions_armed.store(true, Ordering::SeqCst);
    }

    async fn battery(&self) -> Result<BatteryLevel, FleetError> {
        Ok(self.battery.lock().await.clone())
    }
}

/// A fleet of simulated orbs.
///
/// ```rust
/// use orb_arena::fleet::{Fleet, OrbHandle, VirtualFleet};
///
/// #[tokio::main]
/// async fn main() {
///     let fleet = VirtualFleet::new().with_orb("alpha", "/dev/rfcomm0").fail_port("/dev/broken");
///
///     assert!(fleet.materialize(&"beta".into(), "/dev/broken").await.is_err());
///     let orb = fleet.materialize(&"beta".into(), "/dev/rfcomm1").await.unwrap();
///     assert!(orb.supports("roll"));
///     assert_eq!(fleet.enumerate_unlinked_orbs().await.len(), 2);
/// }
/// ```
#[derive(Debug)]
pub struct VirtualFleet {
    commands: HashSet<String>,
    connect_delay: Duration,
    failing_ports: HashSet<String>,
    orbs: Mutex<BTreeMap<OrbName, Arc<VirtualOrb>>>,
    torn_down: Mutex<Vec<OrbName>>,
}

impl Default for VirtualFleet {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFleet {
    pub fn new() -> Self {
        Self {
            commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
            connect_delay: Duration::ZERO,
            failing_ports: HashSet::new(),
            orbs: Mutex::new(BTreeMap::new()),
            torn_down: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the command set of orbs created from now on.
    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Every connect on this port fails.
    pub fn fail_port(mut self, port: impl Into<String>) -> Self {
        self.failing_ports.insert(port.into());
        self
    }

    /// Adds an orb that is already connected when the session starts.
    pub fn with_orb(mut self, name: impl Into<OrbName>, port: impl Into<String>) -> Self {
        let name = name.into();
        let orb = VirtualOrb::new(name.clone(), port.into(), self.commands.clone());
        self.orbs.get_mut().insert(name, Arc::new(orb));
        self
    }

    pub async fn orb(&self, name: &OrbName) -> Option<Arc<VirtualOrb>> {
        self.orbs.lock().await.get(name).cloned()
    }

    pub async fn torn_down(&self) -> Vec<OrbName> {
        self.torn_down.lock().await.clone()
    }
}

#[async_trait]
impl Fleet for VirtualFleet {
    /// Every orb the fleet holds. Links are tracked by the session, not here.
    async fn enumerate_unlinked_orbs(&self) -> HashSet<OrbName> {
        self.orbs.lock().await.keys().cloned().collect()
    }

    async fn materialize(&self, name: &OrbName, port: &str) -> Result<SharedOrb, FleetError> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.failing_ports.contains(port) {
            return Err(FleetError::ConnectFailed {
                name: name.clone(),
                port: port.to_string(),
                reason: "port unavailable".into(),
            });
        }

        let orb = Arc::new(VirtualOrb::new(
            name.clone(),
            port.to_string(),
            self.commands.clone(),
        ));
        self.orbs.lock().await.insert(name.clone(), orb.clone());
        info!(orb = %name, port, "Virtual orb connected");
        Ok(orb)
    }

    async fn teardown(&self, orb: SharedOrb) {
        let name = orb.name().clone();
        let mut orbs = self.orbs.lock().await;
        // A superseded connect must not evict the orb that replaced it.
        let same = orbs.get(&name).is_some_and(|held| {
            Arc::as_ptr(held) as *const () == Arc::as_ptr(&orb) as *const ()
        });
        if same {
            orbs.remove(&name);
        }
        drop(orbs);
        self.torn_down.lock().await.push(name);
    }

    async fn resolve(&self, name: &OrbName) -> Option<SharedOrb> {
        self.orbs
            .lock()
            .await
            .get(name)
            .cloned()
            .map(|orb| orb as SharedOrb)
    }
}
