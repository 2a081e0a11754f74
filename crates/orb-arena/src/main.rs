//! # Orb Arena demo
//!
//! Runs one scripted round against the in-memory fleet:
//!
//! 1. Start the [`ArenaSystem`] with one orb already connected.
//! 2. Attach an operator console and a controller.
//! 3. Link the controller, activate the game and bump the orb.
//! 4. Add a second orb, try one on a dead port, read the batteries.
//!
//! Every frame that would go over the wire is logged as JSON.
//! `RUST_LOG=info` shows the session log, `RUST_LOG=debug` adds every event.

use arena_actor::tracing::setup_tracing;
use orb_arena::channels::{command_stream, CommandIntent, ControllerChannel, OperatorChannel, OperatorRequest};
use orb_arena::config::ArenaConfig;
use orb_arena::fleet::VirtualFleet;
use orb_arena::lifecycle::ArenaSystem;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let fleet = Arc::new(
        VirtualFleet::new()
            .with_orb("alpha", "/dev/rfcomm0")
            .with_connect_delay(Duration::from_millis(50))
            .fail_port("/dev/rfcomm9"),
    );
    let system = ArenaSystem::start(fleet, ArenaConfig::default());
    let client = system.client.clone();

    // Operator console
    let (operator, mut operator_frames) = OperatorChannel::open();
    let operator_log = tokio::spawn(
        async move {
            while let Some(push) = operator_frames.recv().await {
                match push.to_json() {
                    Ok(frame) => info!(%frame, "operator <-"),
                    Err(e) => error!(error = %e, "Unencodable operator frame"),
                }
            }
        }
        .instrument(tracing::info_span!("operator")),
    );
    let operator_id = client
        .connect_operator(operator)
        .await
        .map_err(|e| e.to_string())?;

    // Controller
    let (controller, mut controller_frames) = ControllerChannel::open();
    let controller_log = tokio::spawn(
        async move {
            while let Some(message) = controller_frames.recv().await {
                match message.to_json() {
                    Ok(frame) => info!(%frame, "controller <-"),
                    Err(e) => error!(error = %e, "Unencodable controller frame"),
                }
            }
        }
        .instrument(tracing::info_span!("controller", key = "pad-1")),
    );
    let (commands, stream) = command_stream();
    client
        .connect_controller("pad-1".into(), controller, stream)
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("round");
    async {
        let frames = [
            r#"{"event":"link","data":{"key":"pad-1","orb":"alpha"}}"#,
            r#"{"event":"gameState","data":"active"}"#,
            r#"{"event":"availableCommandsCount","data":3}"#,
            r#"{"event":"addOrb","data":{"name":"beta","port":"/dev/rfcomm1"}}"#,
            r#"{"event":"addOrb","data":{"name":"gamma","port":"/dev/rfcomm9"}}"#,
        ];
        for frame in frames {
            let request = OperatorRequest::from_json(frame).map_err(|e| e.to_string())?;
            client
                .operator_request(operator_id, request)
                .map_err(|e| e.to_string())?;
        }

        commands
            .send(CommandIntent::new("roll", vec![json!(80), json!(0)]))
            .map_err(|e| e.to_string())?;
        commands
            .send(CommandIntent::new("selfDestruct", vec![]))
            .map_err(|e| e.to_string())?;

        client.collision("alpha".into()).map_err(|e| e.to_string())?;
        client.collision("alpha".into()).map_err(|e| e.to_string())?;

        // Let the connects come back before asking for batteries.
        tokio::time::sleep(Duration::from_millis(100)).await;
        client
            .operator_request(operator_id, OperatorRequest::CheckBattery)
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let status = client
            .controller_status("pad-1".into())
            .await
            .map_err(|e| e.to_string())?;
        info!(?status, "Controller after the round");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    client
        .disconnect_controller("pad-1".into())
        .map_err(|e| e.to_string())?;
    client
        .disconnect_operator(operator_id)
        .map_err(|e| e.to_string())?;
    drop(commands);
    drop(client);

    let snapshot = system.shutdown().await.map_err(|e| e.to_string())?;
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => info!("Final session:\n{json}"),
        Err(e) => error!(error = %e, "Could not encode final session"),
    }

    let _ = operator_log.await;
    let _ = controller_log.await;
    Ok(())
}
