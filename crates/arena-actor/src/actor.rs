//! # Actor Event Loop
//!
//! [`Actor`] is the server half of the runtime. It owns a [`Handler`] and the
//! receiving end of the mailbox and feeds messages to the handler one at a
//! time, so a handler's state is only ever touched from a single task.

use crate::client::Mailbox;
use crate::handler::Handler;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Runs a [`Handler`] against a single-consumer message queue.
///
/// # Usage Pattern
///
/// 1.  **Create**: `Actor::new(handler)` returns the actor and its [`Mailbox`].
/// 2.  **Wire**: hand clones of the mailbox (or weak handles) to producers and
///     build the handler's context.
/// 3.  **Run**: spawn `actor.run(context)`; the loop ends once every strong
///     mailbox is dropped and the queue is empty.
///
/// ```rust
/// use arena_actor::{Actor, Handler};
/// use async_trait::async_trait;
///
/// #[derive(Default)]
/// struct Tally { total: u64 }
///
/// #[async_trait]
/// impl Handler for Tally {
///     type Message = u64;
///     type Context = ();
///
///     async fn handle(&mut self, message: u64, _: &()) {
///         self.total += message;
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, mailbox) = Actor::new(Tally::default());
///     let task = tokio::spawn(actor.run(()));
///
///     mailbox.send(2).unwrap();
///     mailbox.send(3).unwrap();
///     drop(mailbox);
///
///     let tally = task.await.unwrap();
///     assert_eq!(tally.total, 5);
/// }
/// ```
pub struct Actor<H: Handler> {
    receiver: mpsc::UnboundedReceiver<H::Message>,
    handler: H,
}

impl<H: Handler> Actor<H> {
    /// Creates the actor and the mailbox that feeds it.
    pub fn new(handler: H) -> (Self, Mailbox<H::Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self { receiver, handler };
        (actor, Mailbox::new(sender))
    }

    /// Runs the event loop until the mailbox closes, then hands the handler
    /// back so callers can inspect the final state.
    pub async fn run(mut self, context: H::Context) -> H {
        // Short type name, e.g. "Orchestrator" rather than the full path.
        let actor = std::any::type_name::<H>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown");
        info!(actor, "Actor started");

        self.handler.on_start(&context).await;

        let mut handled: u64 = 0;
        while let Some(message) = self.receiver.recv().await {
            debug!(actor, ?message, "Handle");
            self.handler.handle(message, &context).await;
            handled += 1;
        }

        self.handler.on_stop(&context).await;
        info!(actor, handled, "Shutdown");
        self.handler
    }
}
