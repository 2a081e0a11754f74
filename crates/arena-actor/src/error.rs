//! # Actor Errors
//!
//! Failures of the message plumbing itself. Domain failures travel inside the
//! reply payload and never show up here.

/// Errors raised while talking to an actor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}
