//! Metric names and registration.
//!
//! Names are fixed for dashboard compatibility: the pool gauges are `size`,
//! `queued-requests`, and `utilization`; request latency is the
//! `request-timer` histogram. The Prometheus exporter sanitizes hyphens on
//! its side of the fence.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pool::PoolSnapshot;

/// Gauge: current dispatch pool worker count.
pub const THREAD_POOL_SIZE: &str = "size";

/// Gauge: requests admitted but not yet picked up by a worker.
pub const THREAD_POOL_QUEUED_REQUESTS: &str = "queued-requests";

/// Gauge: fraction of pool capacity currently busy.
pub const THREAD_POOL_UTILIZATION: &str = "utilization";

/// Histogram: request wall-clock duration in seconds.
pub const REQUEST_TIMER: &str = "request-timer";

/// Install the Prometheus exposition listener on a dedicated address.
///
/// Failure to install is logged, not fatal: the server runs without
/// exposition and all metric updates become no-ops.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exposition listening"),
        Err(error) => tracing::error!(%error, "Failed to install metrics exporter"),
    }
}

/// Describe the pool gauges and the request timer.
pub fn describe_pool_gauges() {
    describe_gauge!(THREAD_POOL_SIZE, "Current dispatch pool worker count");
    describe_gauge!(
        THREAD_POOL_QUEUED_REQUESTS,
        "Requests queued for dispatch"
    );
    describe_gauge!(
        THREAD_POOL_UTILIZATION,
        "Fraction of dispatch pool capacity currently busy"
    );
    describe_histogram!(
        REQUEST_TIMER,
        Unit::Seconds,
        "Request wall-clock duration"
    );
}

/// Publish the pool gauges from a snapshot.
pub fn update_pool_gauges(snapshot: &PoolSnapshot) {
    gauge!(THREAD_POOL_SIZE).set(snapshot.workers as f64);
    gauge!(THREAD_POOL_QUEUED_REQUESTS).set(snapshot.queued_requests as f64);
    gauge!(THREAD_POOL_UTILIZATION).set(snapshot.utilization());
}

/// Record one request's duration into the request timer.
pub fn record_request_time(elapsed: Duration) {
    histogram!(REQUEST_TIMER).record(elapsed.as_secs_f64());
}
