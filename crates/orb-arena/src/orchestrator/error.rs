use crate::fleet::FleetError;
use crate::model::{ControllerKey, OrbName};
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error("Controller already connected: {0}")]
    DuplicateController(ControllerKey),

    #[error("Unknown controller: {0}")]
    UnknownController(ControllerKey),

    #[error("Command {command} is not supported by orb {orb}")]
    UnsupportedCommand { orb: OrbName, command: String },

    #[error("Command {command} to orb {orb} timed out")]
    CommandTimeout { orb: OrbName, command: String },

    #[error("Connect already pending for orb {0}")]
    ConnectPending(OrbName),

    #[error("Connect for orb {0} was cancelled")]
    ConnectCancelled(OrbName),

    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}
