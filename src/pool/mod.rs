//! The instrumented dispatch pool.
//!
//! # Data Flow
//! ```text
//! Request (admitted by the listener)
//!     → dispatch.rs (ship handler future to the pool, or shed with 503)
//!     → worker.rs (bounded workers, FIFO queue, growth & retirement)
//!     → snapshot.rs (consistent gauge views: size, idle, queued, utilization)
//! ```
//!
//! # Design Decisions
//! - Composition over inheritance: the pool owns its counters, nothing
//!   subclasses an executor to observe it
//! - Gauge reads are atomic loads; no lock is held across request execution
//! - Queue-full surfaces at admission as 503, not inside the pool

pub mod dispatch;
pub mod snapshot;
pub mod worker;

pub use dispatch::DispatchLayer;
pub use snapshot::{PoolProbe, PoolSnapshot};
pub use worker::{DispatchPool, SubmitError};
