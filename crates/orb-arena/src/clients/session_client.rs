//! # Session Client
//!
//! The one handle transports and fleet drivers hold. Every method posts a
//! [`SessionEvent`] to the orchestrator's mailbox; the ones that need an
//! answer wait for it. Clones are cheap and all feed the same queue.
use crate::channels::{CommandStream, ControllerChannel, OperatorChannel, OperatorId, OperatorRequest};
use crate::model::{BatteryLevel, ControllerKey, OrbName, SessionSnapshot};
use crate::orchestrator::{ArenaError, ControllerStatus, SessionEvent};
use arena_actor::{ActorClient, ActorError, Mailbox};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct SessionClient {
    inner: Mailbox<SessionEvent>,
}

impl ActorClient<SessionEvent> for SessionClient {
    type Error = ArenaError;

    fn inner(&self) -> &Mailbox<SessionEvent> {
        &self.inner
    }

    fn map_error(e: ActorError) -> Self::Error {
        ArenaError::ActorCommunication(e.to_string())
    }
}

impl SessionClient {
    pub fn new(inner: Mailbox<SessionEvent>) -> Self {
        Self { inner }
    }

    // --- operator console ---

    /// Returns the connection id on success. A second operator gets
    /// [`StoreError::ConnectionRejected`](crate::store::StoreError::ConnectionRejected).
    #[instrument(skip(self, channel))]
    pub async fn connect_operator(&self, channel: OperatorChannel) -> Result<OperatorId, ArenaError> {
        debug!(operator = channel.id(), "Connecting operator");
        self.ask(|respond_to| SessionEvent::OperatorConnected {
            channel,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    pub fn disconnect_operator(&self, id: OperatorId) -> Result<(), ArenaError> {
        self.post(SessionEvent::OperatorDisconnected { id })
    }

    #[instrument(skip(self))]
    pub fn operator_request(&self, id: OperatorId, request: OperatorRequest) -> Result<(), ArenaError> {
        self.post(SessionEvent::OperatorRequest { id, request })
    }

    // --- controllers ---

    #[instrument(skip(self, channel, commands))]
    pub async fn connect_controller(
        &self,
        key: ControllerKey,
        channel: ControllerChannel,
        commands: CommandStream,
    ) -> Result<(), ArenaError> {
        self.ask(|respond_to| SessionEvent::ControllerConnected {
            key,
            channel,
            commands,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    pub fn disconnect_controller(&self, key: ControllerKey) -> Result<(), ArenaError> {
        self.post(SessionEvent::ControllerDisconnected { key })
    }

    /// The controller changed its own link.
    #[instrument(skip(self))]
    pub fn controller_link_changed(
        &self,
        key: ControllerKey,
        orb: Option<OrbName>,
    ) -> Result<(), ArenaError> {
        self.post(SessionEvent::ControllerLinkChanged { key, orb })
    }

    // --- hardware callbacks ---

    /// An orb was connected outside the session and should be picked up.
    #[instrument(skip(self))]
    pub fn orb_added(&self, name: OrbName) -> Result<(), ArenaError> {
        self.post(SessionEvent::OrbAdded { name })
    }

    #[instrument(skip(self))]
    pub fn collision(&self, name: OrbName) -> Result<(), ArenaError> {
        self.post(SessionEvent::Collision { name })
    }

    #[instrument(skip(self))]
    pub fn battery_update(&self, name: OrbName, level: BatteryLevel) -> Result<(), ArenaError> {
        self.post(SessionEvent::Battery { name, level })
    }

    // --- direct API ---

    /// Connects an orb and waits until it is registered or has failed.
    #[instrument(skip(self))]
    pub async fn add_orb(&self, name: OrbName, port: String) -> Result<(), ArenaError> {
        self.ask(|respond_to| SessionEvent::AddOrb {
            name,
            port,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    pub async fn remove_orb(&self, name: OrbName) -> Result<(), ArenaError> {
        self.ask(|respond_to| SessionEvent::RemoveOrb { name, respond_to })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<SessionSnapshot, ArenaError> {
        self.ask(|respond_to| SessionEvent::Snapshot { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn controller_status(
        &self,
        key: ControllerKey,
    ) -> Result<Option<ControllerStatus>, ArenaError> {
        self.ask(|respond_to| SessionEvent::ControllerStatus { key, respond_to })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::command_stream;
    use crate::store::StoreError;
    use arena_actor::mock::{create_mock_mailbox, expect_message};

    #[tokio::test]
    async fn test_connect_operator_passes_rejection_through() {
        let (mailbox, mut receiver) = create_mock_mailbox::<SessionEvent>();
        let client = SessionClient::new(mailbox);
        let (channel, _rx) = OperatorChannel::open();
        let id = channel.id();

        let connect = tokio::spawn(async move { client.connect_operator(channel).await });

        let Some(SessionEvent::OperatorConnected { channel, respond_to }) =
            expect_message(&mut receiver).await
        else {
            panic!("Expected OperatorConnected");
        };
        assert_eq!(channel.id(), id);
        respond_to
            .send(Err(StoreError::ConnectionRejected { id }.into()))
            .unwrap();

        let result = connect.await.unwrap();
        assert_eq!(
            result,
            Err(ArenaError::Store(StoreError::ConnectionRejected { id }))
        );
    }

    #[tokio::test]
    async fn test_add_orb_waits_for_outcome() {
        let (mailbox, mut receiver) = create_mock_mailbox::<SessionEvent>();
        let client = SessionClient::new(mailbox);

        let add = tokio::spawn(async move { client.add_orb("alpha".into(), "1000".into()).await });

        let Some(SessionEvent::AddOrb {
            name,
            port,
            respond_to,
        }) = expect_message(&mut receiver).await
        else {
            panic!("Expected AddOrb");
        };
        assert_eq!(name, OrbName::from("alpha"));
        assert_eq!(port, "1000");
        respond_to.send(Ok(())).unwrap();

        assert_eq!(add.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_hardware_callbacks_are_posted_in_order() {
        let (mailbox, mut receiver) = create_mock_mailbox::<SessionEvent>();
        let client = SessionClient::new(mailbox);

        client.collision("alpha".into()).unwrap();
        client
            .battery_update("alpha".into(), BatteryLevel::new("Battery Low"))
            .unwrap();

        assert!(matches!(
            expect_message(&mut receiver).await,
            Some(SessionEvent::Collision { name }) if name.as_str() == "alpha"
        ));
        assert!(matches!(
            expect_message(&mut receiver).await,
            Some(SessionEvent::Battery { level, .. }) if level.as_str() == "Battery Low"
        ));
    }

    #[tokio::test]
    async fn test_closed_actor_maps_to_communication_error() {
        let (mailbox, receiver) = create_mock_mailbox::<SessionEvent>();
        let client = SessionClient::new(mailbox);
        drop(receiver);

        let (channel, _rx) = crate::channels::ControllerChannel::open();
        let (_tx, commands) = command_stream();
        let result = client
            .connect_controller("c-1".into(), channel, commands)
            .await;
        assert!(matches!(result, Err(ArenaError::ActorCommunication(_))));
        assert!(matches!(
            client.snapshot().await,
            Err(ArenaError::ActorCommunication(_))
        ));
    }
}
