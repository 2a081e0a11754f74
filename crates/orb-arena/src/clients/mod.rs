//! Typed entry points into the session actor.

pub mod session_client;

pub use session_client::SessionClient;
