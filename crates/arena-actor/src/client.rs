//! # Mailbox
//!
//! The sending half of an actor. A [`Mailbox`] is cheap to clone and can be
//! handed to any number of producers; every message it carries ends up in the
//! one queue the actor drains sequentially.
//!
//! The queue is unbounded: producers never wait, which matters for producers
//! that run inside the actor's own spawned tasks. A [`WeakMailbox`] lets those
//! tasks post back without keeping the actor alive after the last strong
//! mailbox is dropped.

use crate::error::ActorError;
use crate::message::Response;
use tokio::sync::{mpsc, oneshot};

/// Cloneable handle used to post messages to an actor.
pub struct Mailbox<M> {
    sender: mpsc::UnboundedSender<M>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M> std::fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<M: Send + 'static> Mailbox<M> {
    pub fn new(sender: mpsc::UnboundedSender<M>) -> Self {
        Self { sender }
    }

    /// Posts a message without waiting for it to be processed.
    pub fn send(&self, message: M) -> Result<(), ActorError> {
        self.sender
            .send(message)
            .map_err(|_| ActorError::ActorClosed)
    }

    /// Posts a message built around a fresh reply channel and waits for the
    /// actor's answer.
    pub async fn request<T, F>(&self, build: F) -> Result<T, ActorError>
    where
        T: Send + 'static,
        F: FnOnce(Response<T>) -> M,
    {
        let (respond_to, response) = oneshot::channel();
        self.send(build(respond_to))?;
        response.await.map_err(|_| ActorError::ActorDropped)
    }

    /// Returns a handle that does not keep the actor alive.
    pub fn downgrade(&self) -> WeakMailbox<M> {
        WeakMailbox {
            sender: self.sender.downgrade(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Non-owning counterpart of [`Mailbox`].
pub struct WeakMailbox<M> {
    sender: mpsc::WeakUnboundedSender<M>,
}

impl<M> Clone for WeakMailbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M> std::fmt::Debug for WeakMailbox<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakMailbox").finish_non_exhaustive()
    }
}

impl<M: Send + 'static> WeakMailbox<M> {
    pub fn upgrade(&self) -> Option<Mailbox<M>> {
        self.sender.upgrade().map(Mailbox::new)
    }

    /// Posts a message if the actor is still reachable.
    pub fn send(&self, message: M) -> Result<(), ActorError> {
        match self.upgrade() {
            Some(mailbox) => mailbox.send(message),
            None => Err(ActorError::ActorClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum TestMessage {
        Ping(Response<&'static str>),
    }

    #[tokio::test]
    async fn request_returns_the_reply() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mailbox = Mailbox::new(sender);

        let responder = tokio::spawn(async move {
            if let Some(TestMessage::Ping(respond_to)) = receiver.recv().await {
                respond_to.send("pong").unwrap();
            }
        });

        let answer = mailbox.request(TestMessage::Ping).await.unwrap();
        assert_eq!(answer, "pong");
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn request_reports_dropped_reply() {
        let (sender, mut receiver) = mpsc::unbounded_channel::<TestMessage>();
        let mailbox = Mailbox::new(sender);

        tokio::spawn(async move {
            // Receive and drop without answering.
            let _ = receiver.recv().await;
        });

        let result = mailbox.request(TestMessage::Ping).await;
        assert_eq!(result, Err(ActorError::ActorDropped));
    }

    #[test]
    fn send_after_receiver_dropped_is_closed() {
        let (sender, receiver) = mpsc::unbounded_channel::<u32>();
        let mailbox = Mailbox::new(sender);
        drop(receiver);

        assert!(mailbox.is_closed());
        assert_eq!(mailbox.send(1), Err(ActorError::ActorClosed));
    }

    #[test]
    fn weak_mailbox_does_not_keep_channel_open() {
        let (sender, mut receiver) = mpsc::unbounded_channel::<u32>();
        let mailbox = Mailbox::new(sender);
        let weak = mailbox.downgrade();

        weak.send(7).unwrap();
        drop(mailbox);

        assert!(weak.upgrade().is_none());
        assert_eq!(weak.send(8), Err(ActorError::ActorClosed));
        assert_eq!(receiver.try_recv().unwrap(), 7);
    }
}
