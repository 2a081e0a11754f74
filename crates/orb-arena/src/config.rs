//! Session tuning knobs.
//!
//! Loading from files or the command line is left to the embedding binary;
//! everything here has a default and deserializes with missing fields filled
//! in.

use crate::model::CommandBudget;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Hit points of a freshly connected controller.
    pub initial_hp: i32,
    /// Subtracted per collision from every eligible linked controller.
    pub collision_damage: i32,
    pub command_budget: CommandBudget,
    /// Arm collision reporting on every registered orb. Off for dry runs
    /// where the fleet has no real sensors.
    pub detect_collisions: bool,
    /// Upper bound on a single command send to an orb.
    pub command_timeout_ms: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_hp: 100,
            collision_damage: 10,
            command_budget: CommandBudget::default(),
            detect_collisions: true,
            command_timeout_ms: 2_000,
        }
    }
}

impl ArenaConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
