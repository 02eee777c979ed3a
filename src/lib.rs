//! Embedded HTTP server harness with an instrumented dispatch pool.
//!
//! slipway wires an axum application behind a bounded, observable dispatch
//! pool: every request runs on one of a bounded set of workers, carries a
//! unique transaction id through its logs, is timed into a latency
//! histogram, and feeds live gauges (pool size, queue depth, utilization)
//! that derived health checks classify into OK/WARNING/CRITICAL. A minimal
//! lifecycle facade exposes the resolved listening endpoints and a
//! drain-then-force stop sequence, and the testing module spins the whole
//! stack up on ephemeral ports for tests.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pool;
pub mod scope;
pub mod testing;

pub use config::ServerConfig;
pub use http::Server;
pub use lifecycle::{ServerHandle, Shutdown};
