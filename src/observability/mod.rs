//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, transaction id on every line)
//!     → metrics.rs (pool gauges, request timer histogram)
//!     → timer.rs (per-request timing contexts)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape on a dedicated address)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (atomic reads, lock-free gauge sets)
//! - Metric names are fixed for dashboard compatibility
//! - Timings record exactly once, on every exit path

pub mod logging;
pub mod metrics;
pub mod timer;

pub use timer::{RequestTimerLayer, RequestTiming};
