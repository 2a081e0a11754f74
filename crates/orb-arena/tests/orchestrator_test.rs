use arena_actor::{Actor, ActorClient};
use async_trait::async_trait;
use orb_arena::channels::{command_stream, CommandIntent, ControllerChannel, OperatorChannel, OperatorRequest};
use orb_arena::clients::SessionClient;
use orb_arena::config::ArenaConfig;
use orb_arena::fleet::{Fleet, FleetError, OrbHandle, SharedOrb, VirtualFleet};
use orb_arena::model::{BatteryLevel, OrbName};
use orb_arena::orchestrator::{Orchestrator, OrchestratorContext, SessionEvent};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An orb whose driver never answers.
#[derive(Debug)]
struct StuckOrb {
    name: OrbName,
    attempts: AtomicUsize,
}

#[async_trait]
impl OrbHandle for StuckOrb {
    fn name(&self) -> &OrbName {
        &self.name
    }

    fn port(&self) -> &str {
        "/dev/stuck"
    }

    fn supports(&self, _command: &str) -> bool {
        true
    }

    async fn send(&self, _command: &str, _args: &[Value]) -> Result<(), FleetError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn detect_collisions(&self) {}

    async fn battery(&self) -> Result<BatteryLevel, FleetError> {
        Err(FleetError::Disconnected(self.name.clone()))
    }
}

/// Reports a ghost orb it cannot resolve next to one stuck orb.
struct StuckFleet {
    orb: Arc<StuckOrb>,
}

#[async_trait]
impl Fleet for StuckFleet {
    async fn enumerate_unlinked_orbs(&self) -> HashSet<OrbName> {
        HashSet::from([self.orb.name.clone(), OrbName::from("ghost")])
    }

    async fn materialize(&self, name: &OrbName, port: &str) -> Result<SharedOrb, FleetError> {
        Err(FleetError::ConnectFailed {
            name: name.clone(),
            port: port.to_string(),
            reason: "read-only fleet".into(),
        })
    }

    async fn teardown(&self, _orb: SharedOrb) {}

    async fn resolve(&self, name: &OrbName) -> Option<SharedOrb> {
        (name == &self.orb.name).then(|| self.orb.clone() as SharedOrb)
    }
}

fn start(config: ArenaConfig) -> (SessionClient, Arc<StuckOrb>, tokio::task::JoinHandle<Orchestrator>) {
    let orb = Arc::new(StuckOrb {
        name: "slow".into(),
        attempts: AtomicUsize::new(0),
    });
    let fleet = Arc::new(StuckFleet { orb: orb.clone() });

    let (actor, mailbox) = Actor::new(Orchestrator::new(config));
    let context = OrchestratorContext {
        fleet,
        mailbox: mailbox.downgrade(),
    };
    let handle = tokio::spawn(actor.run(context));
    (SessionClient::new(mailbox), orb, handle)
}

#[tokio::test]
async fn test_discovery_skips_unresolvable_orbs() {
    let (client, _orb, handle) = start(ArenaConfig::default());

    let snapshot = client.snapshot().await.unwrap();
    let names: Vec<_> = snapshot.orbs.names().map(OrbName::as_str).collect();
    assert_eq!(names, vec!["slow"]);

    drop(client);
    let orchestrator = handle.await.unwrap();
    assert!(orchestrator.store().orbs().contains(&"slow".into()));
}

#[tokio::test]
async fn test_hung_orb_does_not_wedge_the_session() {
    let config = ArenaConfig {
        command_timeout_ms: 20,
        ..ArenaConfig::default()
    };
    let (client, orb, handle) = start(config);

    let (channel, _frames) = ControllerChannel::open();
    let (commands, stream) = command_stream();
    client
        .connect_controller("c-1".into(), channel, stream)
        .await
        .unwrap();
    client
        .controller_link_changed("c-1".into(), Some("slow".into()))
        .unwrap();

    commands.send(CommandIntent::new("roll", vec![])).unwrap();
    commands.send(CommandIntent::new("roll", vec![])).unwrap();

    let status = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if orb.attempts.load(Ordering::SeqCst) == 2 {
                break client.controller_status("c-1".into()).await;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("both commands reached the orb");
    assert_eq!(status.unwrap().unwrap().linked_orb, Some("slow".into()));

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_queued_commands_do_not_delay_collisions() {
    let (client, orb, handle) = start(ArenaConfig::default());
    let (operator, _pushes) = OperatorChannel::open();
    let id = client.connect_operator(operator).await.unwrap();
    client
        .operator_request(id, OperatorRequest::GameState("active".into()))
        .unwrap();

    let (channel, _frames) = ControllerChannel::open();
    let (commands, stream) = command_stream();
    client
        .connect_controller("c-1".into(), channel, stream)
        .await
        .unwrap();
    client
        .controller_link_changed("c-1".into(), Some("slow".into()))
        .unwrap();
    for _ in 0..5 {
        commands.send(CommandIntent::new("roll", vec![])).unwrap();
    }

    // The first send is now hanging in the driver.
    let started = tokio::time::timeout(Duration::from_secs(1), async {
        while orb.attempts.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(started.is_ok());

    client.collision("slow".into()).unwrap();
    let status = tokio::time::timeout(
        Duration::from_millis(500),
        client.controller_status("c-1".into()),
    )
    .await
    .expect("collision applied while commands wait on the orb");
    assert_eq!(status.unwrap().unwrap().hp, 90);
    // Commands stay queued in order behind the hung one.
    assert_eq!(orb.attempts.load(Ordering::SeqCst), 1);

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_failed_battery_query_leaves_roster_untouched() {
    let (client, _orb, handle) = start(ArenaConfig::default());
    let (channel, _frames) = OperatorChannel::open();
    let id = client.connect_operator(channel).await.unwrap();

    client
        .operator_request(id, OperatorRequest::CheckBattery)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.orbs.get(&"slow".into()).unwrap().battery, None);

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_raw_mailbox_posts_reach_the_actor() {
    let (client, _orb, handle) = start(ArenaConfig::default());

    client
        .post(SessionEvent::Battery {
            name: "slow".into(),
            level: BatteryLevel::new("Battery Charging"),
        })
        .unwrap();
    // Unknown orb: logged and dropped.
    client
        .post(SessionEvent::Battery {
            name: "ghost".into(),
            level: BatteryLevel::new("Battery OK"),
        })
        .unwrap();

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(
        snapshot.orbs.get(&"slow".into()).unwrap().battery,
        Some(BatteryLevel::new("Battery Charging"))
    );
    assert_eq!(snapshot.orbs.len(), 1);

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_connect_finishing_after_actor_died_is_torn_down() {
    let fleet = Arc::new(VirtualFleet::new().with_connect_delay(Duration::from_millis(30)));
    let (actor, mailbox) = Actor::new(Orchestrator::new(ArenaConfig::default()));
    let context = OrchestratorContext {
        fleet: fleet.clone(),
        mailbox: mailbox.downgrade(),
    };
    let handle = tokio::spawn(actor.run(context));
    let client = SessionClient::new(mailbox);

    let (operator, _pushes) = OperatorChannel::open();
    let id = client.connect_operator(operator).await.unwrap();
    client
        .operator_request(
            id,
            OperatorRequest::AddOrb {
                name: "late".into(),
                port: "1000".into(),
            },
        )
        .unwrap();
    client.snapshot().await.unwrap();

    // The client still holds the mailbox, so the connect task can upgrade its
    // handle but the post fails.
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    let torn_down = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let torn_down = fleet.torn_down().await;
            if !torn_down.is_empty() {
                break torn_down;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("late orb torn down");
    assert_eq!(torn_down, vec![OrbName::from("late")]);
    drop(client);
}
