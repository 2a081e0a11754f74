//! Session data types shared by the store, the orchestrator and the wire
//! messages.

pub mod controller;
pub mod orb;
pub mod session;

pub use controller::*;
pub use orb::*;
pub use session::*;
