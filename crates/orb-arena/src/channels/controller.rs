//! Controller wire protocol, push channel and command stream.

use super::ChannelClosed;
use crate::model::{CommandBudget, ControllerKey, GamePhase, OrbName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Orchestrator → controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ControllerMessage {
    GameState {
        #[serde(rename = "gameState")]
        game_state: GamePhase,
    },
    AvailableCommandsCount {
        count: CommandBudget,
    },
    Oni(bool),
    Hp {
        hp: i32,
    },
    ClientKey(ControllerKey),
    /// Bind the controller's command queue to this orb.
    Link(OrbName),
    Unlink,
}

impl ControllerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sending half of a controller connection.
#[derive(Debug, Clone)]
pub struct ControllerChannel {
    sender: mpsc::UnboundedSender<ControllerMessage>,
}

impl ControllerChannel {
    pub fn open() -> (Self, mpsc::UnboundedReceiver<ControllerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn push(&self, message: ControllerMessage) -> Result<(), ChannelClosed> {
        self.sender.send(message).map_err(|_| ChannelClosed)
    }

    pub fn link(&self, orb: OrbName) -> Result<(), ChannelClosed> {
        self.push(ControllerMessage::Link(orb))
    }

    pub fn unlink(&self) -> Result<(), ChannelClosed> {
        self.push(ControllerMessage::Unlink)
    }
}

/// A command a controller wants executed on its linked orb.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandIntent {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl CommandIntent {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn from_json(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Producer side of a controller's command stream, kept by the transport.
pub type CommandSender = mpsc::UnboundedSender<CommandIntent>;
/// Consumer side, handed to the session on connect.
pub type CommandStream = mpsc::UnboundedReceiver<CommandIntent>;

pub fn command_stream() -> (CommandSender, CommandStream) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(message: ControllerMessage) -> Value {
        serde_json::from_str(&message.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_controller_frames() {
        assert_eq!(
            encode(ControllerMessage::GameState {
                game_state: GamePhase::Active
            }),
            json!({"event": "gameState", "data": {"gameState": "active"}})
        );
        assert_eq!(
            encode(ControllerMessage::AvailableCommandsCount {
                count: CommandBudget::new(4).unwrap()
            }),
            json!({"event": "availableCommandsCount", "data": {"count": 4}})
        );
        assert_eq!(
            encode(ControllerMessage::Oni(true)),
            json!({"event": "oni", "data": true})
        );
        assert_eq!(
            encode(ControllerMessage::Hp { hp: -10 }),
            json!({"event": "hp", "data": {"hp": -10}})
        );
        assert_eq!(
            encode(ControllerMessage::ClientKey("c-1".into())),
            json!({"event": "clientKey", "data": "c-1"})
        );
        assert_eq!(encode(ControllerMessage::Unlink), json!({"event": "unlink"}));
    }

    #[test]
    fn test_command_intent_args_default_to_empty() {
        let intent = CommandIntent::from_json(r#"{"name":"roll"}"#).unwrap();
        assert_eq!(intent, CommandIntent::new("roll", vec![]));

        let intent = CommandIntent::from_json(r#"{"name":"roll","args":[60,90]}"#).unwrap();
        assert_eq!(intent.args, vec![json!(60), json!(90)]);
    }

    #[tokio::test]
    async fn test_push_after_transport_dropped() {
        let (channel, receiver) = ControllerChannel::open();
        drop(receiver);
        assert_eq!(channel.unlink(), Err(ChannelClosed));
    }
}
