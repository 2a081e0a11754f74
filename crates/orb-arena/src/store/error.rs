use crate::channels::OperatorId;
use crate::model::OrbName;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Orb already registered: {0}")]
    DuplicateOrb(OrbName),

    #[error("Unknown orb: {0}")]
    UnknownOrb(OrbName),

    #[error("Operator connection {id} rejected: another operator is connected")]
    ConnectionRejected { id: OperatorId },
}
