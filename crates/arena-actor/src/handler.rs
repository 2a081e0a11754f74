//! # Handler Trait
//!
//! A [`Handler`] is the state an [`Actor`](crate::Actor) owns, together with the
//! logic that reacts to each message. The actor calls the hooks in a fixed order:
//!
//! 1. [`Handler::on_start`] once, before the first message is admitted.
//! 2. [`Handler::handle`] once per message, strictly one at a time.
//! 3. [`Handler::on_stop`] once, after the mailbox has closed and drained.
//!
//! Because nothing else can reach the handler while a hook runs, a handler may
//! keep several tables that must change together (a roster and the links that
//! point into it, say) without locks. Whatever a hook leaves behind is what the
//! next message observes.

use async_trait::async_trait;
use std::fmt::Debug;

/// State plus message-processing logic driven by an [`Actor`](crate::Actor).
///
/// # Context
/// `Context` is injected into every hook when the actor starts running
/// (`actor.run(context)`), not when the handler is built. This lets a handler
/// depend on collaborators, including a weak handle to its own mailbox, that
/// only exist once the actor has been created.
#[async_trait]
pub trait Handler: Send + 'static {
    /// The message type accepted by the actor's mailbox.
    type Message: Send + Debug + 'static;

    /// Dependencies injected at run time. Use `()` if none are needed.
    type Context: Send + Sync;

    /// Called before the first message is processed.
    async fn on_start(&mut self, _ctx: &Self::Context) {}

    /// Processes a single message. Runs to completion before the next message
    /// is taken from the mailbox.
    async fn handle(&mut self, message: Self::Message, ctx: &Self::Context);

    /// Called after every sender is gone and the mailbox is drained.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}
