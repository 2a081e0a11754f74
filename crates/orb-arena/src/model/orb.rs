//! Orb roster types.
//!
//! The roster is what the operator console renders: one row per orb, in
//! registration order, with the last known battery report and whether any
//! controller currently drives it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;

/// Unique name of an orb within the fleet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrbName(String);

impl OrbName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrbName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for OrbName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Display for OrbName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Battery state as reported by the orb driver (e.g. `"Battery OK"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatteryLevel(String);

impl BatteryLevel {
    pub fn new(level: impl Into<String>) -> Self {
        Self(level.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Linked,
    #[default]
    Unlinked,
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbSummary {
    #[serde(rename = "orbName")]
    pub name: OrbName,
    pub port: String,
    /// `None` until the first battery report arrives.
    pub battery: Option<BatteryLevel>,
    #[serde(rename = "link")]
    pub link_status: LinkStatus,
}

impl OrbSummary {
    /// A freshly registered orb: battery unknown, not linked.
    pub fn new(name: impl Into<OrbName>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
            battery: None,
            link_status: LinkStatus::Unlinked,
        }
    }
}

/// Ordered orb roster with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrbRoster(Vec<OrbSummary>);

impl OrbRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &OrbName) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &OrbName) -> Option<&OrbSummary> {
        self.0.iter().find(|orb| &orb.name == name)
    }

    pub fn get_mut(&mut self, name: &OrbName) -> Option<&mut OrbSummary> {
        self.0.iter_mut().find(|orb| &orb.name == name)
    }

    /// Appends `summary` unless an orb with the same name is present.
    /// Returns `false` (and leaves the roster untouched) on a name clash.
    pub fn insert(&mut self, summary: OrbSummary) -> bool {
        if self.contains(&summary.name) {
            return false;
        }
        self.0.push(summary);
        true
    }

    pub fn remove(&mut self, name: &OrbName) -> Option<OrbSummary> {
        let index = self.0.iter().position(|orb| &orb.name == name)?;
        Some(self.0.remove(index))
    }

    /// Marks every orb named in `unlinked` as unlinked and all others as linked.
    pub fn apply_unlinked(&mut self, unlinked: &HashSet<OrbName>) {
        for orb in &mut self.0 {
            orb.link_status = if unlinked.contains(&orb.name) {
                LinkStatus::Unlinked
            } else {
                LinkStatus::Linked
            };
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &OrbName> {
        self.0.iter().map(|orb| &orb.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrbSummary> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
