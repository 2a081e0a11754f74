//! # ActorClient Trait
//!
//! Domain clients wrap a [`Mailbox`] and translate plumbing failures into their
//! own error type. Implementing [`ActorClient`] gives them `post` and `ask` for
//! free, so each domain method is a one-liner around a message constructor.
use crate::{ActorError, Mailbox, Response};
use async_trait::async_trait;

/// Trait for domain-specific clients built on a [`Mailbox`].
///
/// # Example
///
/// ```rust
/// use arena_actor::{ActorClient, ActorError, Mailbox, Response};
///
/// #[derive(Debug)]
/// enum CounterMessage {
///     Bump,
///     Read(Response<u32>),
/// }
///
/// #[derive(Debug)]
/// struct CounterError(String);
///
/// struct CounterClient {
///     inner: Mailbox<CounterMessage>,
/// }
///
/// impl ActorClient<CounterMessage> for CounterClient {
///     type Error = CounterError;
///
///     fn inner(&self) -> &Mailbox<CounterMessage> {
///         &self.inner
///     }
///
///     fn map_error(e: ActorError) -> Self::Error {
///         CounterError(e.to_string())
///     }
/// }
///
/// async fn usage(client: CounterClient) -> Result<u32, CounterError> {
///     client.post(CounterMessage::Bump)?;
///     client.ask(CounterMessage::Read).await
/// }
/// ```
#[async_trait]
pub trait ActorClient<M: Send + 'static>: Send + Sync {
    /// The domain error type.
    type Error: Send;

    /// Access the inner mailbox.
    fn inner(&self) -> &Mailbox<M>;

    /// Map plumbing errors to the domain error type.
    fn map_error(e: ActorError) -> Self::Error;

    /// Fire-and-forget post.
    fn post(&self, message: M) -> Result<(), Self::Error> {
        self.inner().send(message).map_err(Self::map_error)
    }

    /// Post a request and wait for the reply.
    async fn ask<T, F>(&self, build: F) -> Result<T, Self::Error>
    where
        T: Send + 'static,
        F: FnOnce(Response<T>) -> M + Send + 'static,
    {
        tracing::trace!("Sending request");
        self.inner().request(build).await.map_err(Self::map_error)
    }
}
