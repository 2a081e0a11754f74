//! # Orb Arena
//!
//! Session coordinator for a robot-orb game: one operator console configures
//! the game, several remote controllers each drive an orb, and collisions
//! reported by the orbs cost the drivers hit points.
//!
//! ## Modules
//!
//! - [`model`] - session record types with their invariants.
//! - [`store`] - the [`SessionStore`](store::SessionStore): validated operator
//!   edits, operator slot, typed events.
//! - [`orchestrator`] - the actor that owns the store and the runtime
//!   registries and applies the game rules.
//! - [`channels`] - operator and controller wire messages and endpoints.
//! - [`fleet`] - the robot fleet collaborator and an in-memory fleet.
//! - [`clients`] - [`SessionClient`](clients::SessionClient), the handle
//!   transports and drivers post through.
//! - [`lifecycle`] - starting and stopping the whole thing.
//! - [`config`] - tuning knobs.

pub mod channels;
pub mod clients;
pub mod config;
pub mod fleet;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod store;
