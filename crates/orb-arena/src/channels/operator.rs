//! Operator console wire protocol and channel.
//!
//! Frames are JSON objects of the form `{"event": <name>, "data": <payload>}`.
//! The phase and budget travel untyped on the way in so that the store can
//! see, and ignore, out-of-domain values.

use super::ChannelClosed;
use crate::model::{ControllerKey, OrbName, OrbRoster, SessionSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Identifies one operator connection attempt.
pub type OperatorId = u64;

static NEXT_OPERATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Operator → store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OperatorRequest {
    GameState(String),
    AvailableCommandsCount(i64),
    Link {
        key: ControllerKey,
        orb: Option<OrbName>,
    },
    AddOrb {
        name: OrbName,
        port: String,
    },
    RemoveOrb {
        name: OrbName,
    },
    Oni {
        key: ControllerKey,
        enabled: bool,
    },
    CheckBattery,
}

impl OperatorRequest {
    pub fn from_json(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Store → operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OperatorPush {
    /// Sent once, right after the connection is accepted.
    DefaultData(SessionSnapshot),
    AddController(ControllerKey),
    RemoveController(ControllerKey),
    UpdateOrbs(OrbRoster),
    OrbConnectFailed { name: OrbName, reason: String },
}

impl OperatorPush {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sending half of an operator connection. Dropping it closes the
/// connection from the session's side.
#[derive(Debug)]
pub struct OperatorChannel {
    id: OperatorId,
    sender: mpsc::UnboundedSender<OperatorPush>,
}

impl OperatorChannel {
    /// Opens a channel with a fresh connection id. The transport keeps the
    /// receiver and forwards whatever arrives on it to the console.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<OperatorPush>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = NEXT_OPERATOR_ID.fetch_add(1, Ordering::Relaxed);
        (Self { id, sender }, receiver)
    }

    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn push(&self, message: OperatorPush) -> Result<(), ChannelClosed> {
        self.sender.send(message).map_err(|_| ChannelClosed)
    }

    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommandBudget, GamePhase, LinkTable, OrbSummary};

    #[test]
    fn test_decode_operator_requests() {
        let cases = [
            (
                r#"{"event":"gameState","data":"active"}"#,
                OperatorRequest::GameState("active".into()),
            ),
            (
                r#"{"event":"availableCommandsCount","data":9}"#,
                OperatorRequest::AvailableCommandsCount(9),
            ),
            (
                r#"{"event":"link","data":{"key":"c-1","orb":null}}"#,
                OperatorRequest::Link {
                    key: "c-1".into(),
                    orb: None,
                },
            ),
            (
                r#"{"event":"addOrb","data":{"name":"alpha","port":"/dev/rfcomm0"}}"#,
                OperatorRequest::AddOrb {
                    name: "alpha".into(),
                    port: "/dev/rfcomm0".into(),
                },
            ),
            (
                r#"{"event":"oni","data":{"key":"c-2","enabled":true}}"#,
                OperatorRequest::Oni {
                    key: "c-2".into(),
                    enabled: true,
                },
            ),
        ];

        for (frame, expected) in cases {
            assert_eq!(OperatorRequest::from_json(frame).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_event_is_a_decode_error() {
        assert!(OperatorRequest::from_json(r#"{"event":"selfDestruct","data":1}"#).is_err());
    }

    #[test]
    fn test_default_data_frame_shape() {
        let mut links = LinkTable::new();
        links.insert_unlinked("c-1".into());
        let mut orbs = OrbRoster::new();
        orbs.insert(OrbSummary::new("alpha", "/dev/rfcomm0"));

        let push = OperatorPush::DefaultData(SessionSnapshot {
            game_phase: GamePhase::Inactive,
            command_budget: CommandBudget::default(),
            links,
            orbs,
        });
        let json: serde_json::Value = serde_json::from_str(&push.to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "event": "defaultData",
                "data": {
                    "gamePhase": "inactive",
                    "commandBudget": 1,
                    "links": { "c-1": null },
                    "orbs": [
                        { "orbName": "alpha", "port": "/dev/rfcomm0", "battery": null, "link": "unlinked" }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_channel_ids_are_unique_and_close_is_observable() {
        let (first, _first_rx) = OperatorChannel::open();
        let (second, mut second_rx) = OperatorChannel::open();
        assert_ne!(first.id(), second.id());

        second.close();
        assert!(matches!(
            second_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
