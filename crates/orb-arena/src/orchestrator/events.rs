//! Everything the orchestrator actor reacts to. Transports, the fleet and the
//! actor's own background tasks all post into the same mailbox.

use super::error::ArenaError;
use super::registry::ControllerStatus;
use crate::channels::{
    CommandIntent, CommandStream, ControllerChannel, OperatorChannel, OperatorId, OperatorRequest,
};
use crate::fleet::{FleetError, SharedOrb};
use crate::model::{BatteryLevel, ControllerKey, OrbName, SessionSnapshot};
use arena_actor::Response;

#[derive(Debug)]
pub enum SessionEvent {
    // operator console
    OperatorConnected {
        channel: OperatorChannel,
        respond_to: Response<Result<OperatorId, ArenaError>>,
    },
    OperatorDisconnected {
        id: OperatorId,
    },
    OperatorRequest {
        id: OperatorId,
        request: OperatorRequest,
    },

    // controllers
    ControllerConnected {
        key: ControllerKey,
        channel: ControllerChannel,
        commands: CommandStream,
        respond_to: Response<Result<(), ArenaError>>,
    },
    ControllerDisconnected {
        key: ControllerKey,
    },
    ControllerLinkChanged {
        key: ControllerKey,
        orb: Option<OrbName>,
    },
    Command {
        key: ControllerKey,
        intent: CommandIntent,
    },

    // fleet and hardware
    OrbAdded {
        name: OrbName,
    },
    OrbMaterialized {
        name: OrbName,
        request: u64,
        result: Result<SharedOrb, FleetError>,
    },
    Collision {
        name: OrbName,
    },
    Battery {
        name: OrbName,
        level: BatteryLevel,
    },

    // direct API
    AddOrb {
        name: OrbName,
        port: String,
        respond_to: Response<Result<(), ArenaError>>,
    },
    RemoveOrb {
        name: OrbName,
        respond_to: Response<Result<(), ArenaError>>,
    },
    Snapshot {
        respond_to: Response<SessionSnapshot>,
    },
    ControllerStatus {
        key: ControllerKey,
        respond_to: Response<Option<ControllerStatus>>,
    },
}
