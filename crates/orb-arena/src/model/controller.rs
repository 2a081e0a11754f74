use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier a controller is known by for the lifetime of its connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerKey(String);

impl ControllerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ControllerKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ControllerKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Display for ControllerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
