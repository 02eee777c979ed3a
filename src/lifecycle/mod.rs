//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → start pool → register checks → assemble router
//!     → bind connectors → ServerHandle
//!
//! Shutdown (shutdown.rs, facade.rs):
//!     trigger → stop accepting → drain connections & pool → force stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Connectors bind last, so traffic only arrives once ready
//! - Shutdown has a grace period: forced stop after the deadline

pub mod facade;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use facade::{ConnectorEndpoint, LifecycleError, ServerHandle};
pub use shutdown::Shutdown;
pub use startup::StartupError;
