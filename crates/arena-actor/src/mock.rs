//! # Mock Mailboxes & Testing Guide
//!
//! Testing an actor end to end means spawning it, which is often more than a
//! test needs. When the subject under test is the code *around* an actor (a
//! client wrapper, a transport adapter) it is enough to intercept the messages
//! that code posts.
//!
//! ## Testing Strategies
//!
//! | Pattern | Tools | Use Case |
//! |---------|-------|----------|
//! | Client logic | [`create_mock_mailbox`] + [`expect_message`] | Assert which message a client posts and answer it by hand |
//! | Single actor | `Actor::new` + `tokio::spawn(actor.run(ctx))` | Exercise one handler's state transitions |
//! | Full system | The application's lifecycle wrapper | End-to-end flows across collaborators |
//!
//! ## Client Logic Test
//!
//! ```rust
//! use arena_actor::mock::{create_mock_mailbox, expect_message};
//! use arena_actor::Response;
//!
//! #[derive(Debug)]
//! enum Message {
//!     Lookup { key: String, respond_to: Response<Option<u32>> },
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mailbox, mut receiver) = create_mock_mailbox::<Message>();
//!
//!     let lookup = tokio::spawn(async move {
//!         mailbox
//!             .request(|respond_to| Message::Lookup { key: "a".into(), respond_to })
//!             .await
//!     });
//!
//!     let Message::Lookup { key, respond_to } = expect_message(&mut receiver)
//!         .await
//!         .expect("Expected Lookup request");
//!     assert_eq!(key, "a");
//!     respond_to.send(Some(7)).unwrap();
//!
//!     assert_eq!(lookup.await.unwrap(), Ok(Some(7)));
//! }
//! ```

use crate::client::Mailbox;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long [`expect_message`] waits before giving up.
pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Creates a mailbox whose messages land in a receiver the test controls.
pub fn create_mock_mailbox<M: Send + 'static>() -> (Mailbox<M>, mpsc::UnboundedReceiver<M>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Mailbox::new(sender), receiver)
}

/// Waits for the next message, or `None` if the channel closed or nothing
/// arrived within [`EXPECT_TIMEOUT`].
pub async fn expect_message<M>(receiver: &mut mpsc::UnboundedReceiver<M>) -> Option<M> {
    tokio::time::timeout(EXPECT_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()
}

/// Collects every message currently queued without waiting for more.
pub fn drain_messages<M>(receiver: &mut mpsc::UnboundedReceiver<M>) -> Vec<M> {
    let mut messages = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        messages.push(message);
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Response;

    #[derive(Debug)]
    enum Ping {
        Note(&'static str),
        Ask(Response<bool>),
    }

    #[tokio::test]
    async fn test_expect_message_answers_request() {
        let (mailbox, mut receiver) = create_mock_mailbox::<Ping>();

        let ask = tokio::spawn(async move { mailbox.request(Ping::Ask).await });

        match expect_message(&mut receiver).await {
            Some(Ping::Ask(respond_to)) => respond_to.send(true).unwrap(),
            other => panic!("Expected Ask, got {:?}", other),
        }
        assert_eq!(ask.await.unwrap(), Ok(true));
    }

    #[tokio::test]
    async fn test_expect_message_times_out_on_silence() {
        let (_mailbox, mut receiver) = create_mock_mailbox::<Ping>();
        assert!(expect_message(&mut receiver).await.is_none());
    }

    #[test]
    fn test_drain_messages_keeps_order() {
        let (mailbox, mut receiver) = create_mock_mailbox::<Ping>();
        mailbox.send(Ping::Note("first")).unwrap();
        mailbox.send(Ping::Note("second")).unwrap();

        let notes: Vec<_> = drain_messages(&mut receiver)
            .into_iter()
            .map(|message| match message {
                Ping::Note(text) => text,
                Ping::Ask(_) => "ask",
            })
            .collect();
        assert_eq!(notes, vec!["first", "second"]);
    }
}
