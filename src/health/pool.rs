//! Pool-backed health checks.
//!
//! Both checks read one [`PoolSnapshot`] per invocation and classify a
//! single value against a warning/critical threshold pair. Reaching a
//! threshold enters that band: `value >= critical` is CRITICAL, otherwise
//! `value >= warning` is WARNING.

use std::sync::Arc;

use crate::config::Thresholds;
use crate::health::check::HealthCheck;
use crate::health::outcome::{HealthOutcome, HealthStatus};
use crate::pool::PoolProbe;

/// Default name the utilization check is registered under.
pub const UTILIZATION_CHECK: &str = "pool-utilization";

/// Default name the queued-requests check is registered under.
pub const QUEUED_REQUESTS_CHECK: &str = "pool-queued-requests";

fn classify<T: PartialOrd>(value: T, thresholds: &Thresholds<T>) -> HealthStatus {
    if value >= thresholds.critical {
        HealthStatus::Critical
    } else if value >= thresholds.warning {
        HealthStatus::Warning
    } else {
        HealthStatus::Ok
    }
}

fn outcome(status: HealthStatus, message: String) -> HealthOutcome {
    match status {
        HealthStatus::Ok => HealthOutcome::ok_with_message(message),
        HealthStatus::Warning => HealthOutcome::warning(message),
        HealthStatus::Critical => HealthOutcome::critical(message),
    }
}

/// Classifies pool utilization against configured thresholds.
pub struct PoolUtilizationCheck {
    probe: Arc<dyn PoolProbe>,
    thresholds: Thresholds<f64>,
}

impl PoolUtilizationCheck {
    pub fn new(probe: Arc<dyn PoolProbe>, thresholds: Thresholds<f64>) -> Self {
        Self { probe, thresholds }
    }
}

impl HealthCheck for PoolUtilizationCheck {
    fn check(&self) -> HealthOutcome {
        let snapshot = self.probe.snapshot();
        let utilization = snapshot.utilization();
        let status = classify(utilization, &self.thresholds);
        outcome(
            status,
            format!(
                "utilization {:.2}, {} of {} workers busy",
                utilization,
                snapshot.busy_workers(),
                snapshot.max_workers
            ),
        )
    }
}

/// Classifies dispatch queue depth against configured thresholds.
pub struct QueuedRequestsCheck {
    probe: Arc<dyn PoolProbe>,
    thresholds: Thresholds<usize>,
}

impl QueuedRequestsCheck {
    pub fn new(probe: Arc<dyn PoolProbe>, thresholds: Thresholds<usize>) -> Self {
        Self { probe, thresholds }
    }
}

impl HealthCheck for QueuedRequestsCheck {
    fn check(&self) -> HealthOutcome {
        let snapshot = self.probe.snapshot();
        let queued = snapshot.queued_requests;
        let status = classify(queued, &self.thresholds);
        outcome(status, format!("{queued} requests queued"))
    }
}
