//! Push/pull endpoints towards the operator console and the controllers.
//!
//! Transport plumbing (sockets, framing, static assets) lives outside this
//! crate. A transport adapter owns the receiving half of each channel, turns
//! the pushed messages into frames with `to_json`, and feeds decoded requests
//! back through the [`SessionClient`](crate::clients::SessionClient).

pub mod controller;
pub mod operator;

pub use controller::*;
pub use operator::*;

/// The peer behind a channel has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("channel closed")]
pub struct ChannelClosed;
