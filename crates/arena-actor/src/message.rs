//! # Request/Response Plumbing
//!
//! Messages that expect an answer carry a [`Response`] sender. The handler
//! answers with [`reply`]; the requester awaits the matching receiver inside
//! [`Mailbox::request`](crate::Mailbox::request).

use tokio::sync::oneshot;
use tracing::debug;

/// One-shot reply channel embedded in request messages.
pub type Response<T> = oneshot::Sender<T>;

/// Sends `value` back to the requester.
///
/// A requester that stopped waiting is not an error for the actor; the reply
/// is dropped and the event is logged at debug level.
pub fn reply<T>(respond_to: Response<T>, value: T) {
    if respond_to.send(value).is_err() {
        debug!("Requester dropped before reply");
    }
}
