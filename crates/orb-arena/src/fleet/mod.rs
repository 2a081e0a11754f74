//! Robot fleet collaborator.
//!
//! The session never talks to hardware directly. A [`Fleet`] turns names and
//! ports into live [`OrbHandle`]s and tears them down again; hardware
//! interrupts (collisions, hot-plugged orbs) are reported back through the
//! [`SessionClient`](crate::clients::SessionClient).

mod virtual_fleet;

pub use virtual_fleet::{SentCommand, VirtualFleet, VirtualOrb, DEFAULT_BATTERY, DEFAULT_COMMANDS};

use crate::model::{BatteryLevel, OrbName};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("Could not connect orb {name} on {port}: {reason}")]
    ConnectFailed {
        name: OrbName,
        port: String,
        reason: String,
    },

    #[error("Orb not found: {0}")]
    NotFound(OrbName),

    #[error("Orb {name} rejected {command}: {reason}")]
    CommandFailed {
        name: OrbName,
        command: String,
        reason: String,
    },

    #[error("Orb disconnected: {0}")]
    Disconnected(OrbName),
}

/// A connected robot.
#[async_trait]
pub trait OrbHandle: Send + Sync + Debug {
    fn name(&self) -> &OrbName;

    fn port(&self) -> &str;

    /// Whether the driver knows a command by this name.
    fn supports(&self, command: &str) -> bool;

    async fn send(&self, command: &str, args: &[Value]) -> Result<(), FleetError>;

    /// Starts reporting collisions for this orb.
    fn detect_collisions(&self);

    async fn battery(&self) -> Result<BatteryLevel, FleetError>;
}

pub type SharedOrb = Arc<dyn OrbHandle>;

#[async_trait]
pub trait Fleet: Send + Sync {
    /// Names of the orbs the fleet holds that no controller drives.
    async fn enumerate_unlinked_orbs(&self) -> HashSet<OrbName>;

    /// Opens the port and returns the connected orb. May take a while.
    async fn materialize(&self, name: &OrbName, port: &str) -> Result<SharedOrb, FleetError>;

    async fn teardown(&self, orb: SharedOrb);

    async fn resolve(&self, name: &OrbName) -> Option<SharedOrb>;
}
