//! # Arena Actor
//!
//! A small single-consumer actor runtime on top of Tokio.
//!
//! An [`Actor`] owns a [`Handler`] and drains one unbounded queue. Producers
//! post through cloneable [`Mailbox`] handles; anything that needs an answer
//! embeds a [`Response`] sender and awaits it. Messages are handled strictly
//! one at a time, so a handler may keep several related tables and update them
//! together without locks: no other message can observe a half-finished
//! update.
//!
//! ## Pieces
//!
//! - [`Handler`] - state plus `on_start` / `handle` / `on_stop` hooks.
//! - [`Actor`] - the event loop; `run(context)` injects dependencies late.
//! - [`Mailbox`] / [`WeakMailbox`] - producer handles; the weak one lets an
//!   actor's own tasks post back without keeping it alive.
//! - [`ActorClient`] - helper trait for typed domain clients.
//! - [`mock`] - test helpers for code that talks to a mailbox.
//! - [`tracing`] - subscriber setup for binaries.
//!
//! ## Shutdown
//!
//! The loop ends when every strong [`Mailbox`] is gone and the queue is
//! empty. Tasks spawned by a handler should hold a [`WeakMailbox`]; a strong
//! handle held by the actor itself would keep the loop alive forever.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod error;
pub mod handler;
pub mod message;
pub mod mock;
pub mod tracing;

pub use actor::Actor;
pub use client::{Mailbox, WeakMailbox};
pub use client_trait::ActorClient;
pub use error::ActorError;
pub use handler::Handler;
pub use message::{reply, Response};
