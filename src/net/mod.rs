//! Network subsystem.
//!
//! # Responsibilities
//! - Bind configured connectors (ephemeral port resolution included)
//! - Bounded accept loops with graceful drain on shutdown

pub mod listener;

pub use listener::{Connector, ListenerError};
