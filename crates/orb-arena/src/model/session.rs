//! Session-wide settings and the operator-facing snapshot.

use super::{ControllerKey, OrbName, OrbRoster};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Out-of-domain operator input. Never surfaced to the operator; the store
/// logs it and keeps the previous value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown game phase: {0:?}")]
    GamePhase(String),
    #[error("command budget {0} is outside {min}..={max}", min = CommandBudget::MIN, max = CommandBudget::MAX)]
    CommandBudget(i64),
}

/// Gate for collision damage. Changed only by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Inactive,
    Active,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Inactive => "inactive",
            GamePhase::Active => "active",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, GamePhase::Active)
    }
}

impl FromStr for GamePhase {
    type Err = ValidationError;

    /// Exact, case-sensitive match on the wire names.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "inactive" => Ok(GamePhase::Inactive),
            "active" => Ok(GamePhase::Active),
            other => Err(ValidationError::GamePhase(other.to_string())),
        }
    }
}

impl Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of simultaneous command slots advertised to controllers, `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct CommandBudget(u8);

impl CommandBudget {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(count: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&count) {
            Ok(Self(count as u8))
        } else {
            Err(ValidationError::CommandBudget(count))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for CommandBudget {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<i64> for CommandBudget {
    type Error = ValidationError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<CommandBudget> for u8 {
    fn from(budget: CommandBudget) -> Self {
        budget.0
    }
}

impl Display for CommandBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Controller key → requested orb. Holds an entry for every connected
/// controller and nothing else; `None` means unlinked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LinkTable(BTreeMap<ControllerKey, Option<OrbName>>);

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` as unlinked. Returns `false` if it was already present.
    pub fn insert_unlinked(&mut self, key: ControllerKey) -> bool {
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, None);
        true
    }

    pub fn remove(&mut self, key: &ControllerKey) -> bool {
        self.0.remove(key).is_some()
    }

    /// Records a link for a present key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &ControllerKey, orb: Option<OrbName>) -> bool {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = orb;
                true
            }
            None => false,
        }
    }

    /// Unlinks every key pointing at `orb` and returns how many there were.
    pub fn clear_orb(&mut self, orb: &OrbName) -> usize {
        let mut cleared = 0;
        for slot in self.0.values_mut() {
            if slot.as_ref() == Some(orb) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// `None` if the key is absent, `Some(None)` if present but unlinked.
    pub fn get(&self, key: &ControllerKey) -> Option<Option<&OrbName>> {
        self.0.get(key).map(Option::as_ref)
    }

    pub fn contains(&self, key: &ControllerKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ControllerKey, Option<&OrbName>)> {
        self.0.iter().map(|(key, orb)| (key, orb.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a freshly connected operator needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub game_phase: GamePhase,
    pub command_budget: CommandBudget,
    pub links: LinkTable,
    pub orbs: OrbRoster,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_phase_parses_only_exact_names() {
        assert_eq!("active".parse::<GamePhase>(), Ok(GamePhase::Active));
        assert_eq!("inactive".parse::<GamePhase>(), Ok(GamePhase::Inactive));
        for raw in ["Active", "reactive", "", "paused"] {
            assert!(raw.parse::<GamePhase>().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_command_budget_bounds() {
        assert!(CommandBudget::new(0).is_err());
        assert_eq!(CommandBudget::new(1).unwrap().get(), 1);
        assert_eq!(CommandBudget::new(6).unwrap().get(), 6);
        assert_eq!(
            CommandBudget::new(7),
            Err(ValidationError::CommandBudget(7))
        );
        assert!(CommandBudget::new(-3).is_err());
    }

    #[test]
    fn test_command_budget_deserialize_validates() {
        let ok: CommandBudget = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<CommandBudget>("9").is_err());
    }

    #[test]
    fn test_link_table_only_updates_known_keys() {
        let mut links = LinkTable::new();
        let key = ControllerKey::from("c-1");
        assert!(links.insert_unlinked(key.clone()));
        assert!(!links.insert_unlinked(key.clone()));

        assert!(links.set(&key, Some("A".into())));
        assert_eq!(links.get(&key), Some(Some(&OrbName::from("A"))));

        assert!(!links.set(&"ghost".into(), Some("A".into())));
        assert_eq!(links.get(&"ghost".into()), None);

        links.insert_unlinked("c-2".into());
        assert_eq!(links.clear_orb(&"A".into()), 1);
        assert_eq!(links.get(&key), Some(None));
        assert_eq!(links.clear_orb(&"A".into()), 0);
        assert_eq!(links.len(), 1);
    }
}
