//! # Observability & Tracing
//!
//! Structured logging for every actor and client in the workspace.
//!
//! The event loop logs `Actor started` / `Shutdown` with the handler's short
//! type name and a per-message `Handle` line at debug level. Clients use
//! `#[instrument]`, so request logs nest under the calling span.
//!
//! ```bash
//! # Lifecycle and game events
//! RUST_LOG=info cargo run
//!
//! # Every message that enters the loop, with payloads
//! RUST_LOG=debug cargo run
//!
//! # A single crate
//! RUST_LOG=orb_arena=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a short session looks like:
//!
//! ```text
//! INFO Actor started actor="Orchestrator"
//! INFO Orb registered orb=alpha
//! INFO Discovery finished orbs=1
//! INFO Controller connected key=c-1
//! INFO Game phase set phase=active
//! ```

/// Installs the global subscriber. Call once, from the binary.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
