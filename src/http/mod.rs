//! HTTP assembly subsystem.
//!
//! # Data Flow
//! ```text
//! Connector (net) accepts a connection
//!     → CORS filters (cors.rs, pattern-scoped, ascending order)
//!     → timeout / trace
//!     → request scope (transaction id into span + extensions)
//!     → request timer
//!     → dispatch pool
//!     → context-mounted application router + health endpoint
//! ```

pub mod cors;
pub mod health_endpoint;
pub mod server;

pub use cors::CorsBuildError;
pub use server::Server;
