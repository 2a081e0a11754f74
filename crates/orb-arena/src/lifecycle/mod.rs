//! # System Lifecycle
//!
//! Starting and stopping the session actor.
//!
//! ## Wiring
//!
//! [`ArenaSystem::start`] builds the [`Orchestrator`](crate::orchestrator::Orchestrator),
//! injects the fleet and a weak handle to the actor's own mailbox through
//! `run(context)`, and spawns the loop. The strong mailbox goes into the
//! returned [`SessionClient`](crate::clients::SessionClient); transports clone it.
//!
//! ```rust
//! use orb_arena::config::ArenaConfig;
//! use orb_arena::fleet::VirtualFleet;
//! use orb_arena::lifecycle::ArenaSystem;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fleet = Arc::new(VirtualFleet::new().with_orb("alpha", "/dev/rfcomm0"));
//!     let system = ArenaSystem::start(fleet, ArenaConfig::default());
//!
//!     let snapshot = system.client.snapshot().await.unwrap();
//!     assert_eq!(snapshot.orbs.len(), 1);
//!
//!     system.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Shutdown
//!
//! 1. Every [`SessionClient`](crate::clients::SessionClient) clone is dropped.
//!    Background tasks only hold weak handles and do not count.
//! 2. The actor drains what is left in its queue, then tears down every
//!    registered orb in `on_stop`.
//! 3. [`ArenaSystem::shutdown`] awaits the task and returns the final snapshot.
//!
//! A transport that still holds a clone keeps the session alive; stop the
//! transports first.

pub mod arena_system;

pub use arena_system::*;
