//! Health checks and the registry running them.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::health::outcome::HealthOutcome;

/// A named, on-demand health probe.
///
/// Implementations must be side-effect-free and safe to call concurrently
/// with live traffic; anything they read should be a consistent snapshot,
/// not a series of independent reads.
pub trait HealthCheck: Send + Sync {
    fn check(&self) -> HealthOutcome;
}

/// An ordered registry of health checks.
///
/// Running a check never propagates a failure: a panicking check is caught
/// and reported as a CRITICAL outcome carrying the panic message.
#[derive(Clone, Default)]
pub struct HealthRegistry {
    checks: Vec<(String, Arc<dyn HealthCheck>)>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under a name. Re-registering a name replaces the
    /// previous check, keeping its position.
    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) {
        let name = name.into();
        if let Some(entry) = self.checks.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = check;
        } else {
            self.checks.push((name, check));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(name, _)| name.as_str())
    }

    /// Run one check by name. `None` when the name is unknown.
    pub fn run(&self, name: &str) -> Option<HealthOutcome> {
        self.checks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, check)| run_guarded(n, check.as_ref()))
    }

    /// Run every registered check, in registration order.
    pub fn run_all(&self) -> Vec<(String, HealthOutcome)> {
        self.checks
            .iter()
            .map(|(name, check)| (name.clone(), run_guarded(name, check.as_ref())))
            .collect()
    }
}

fn run_guarded(name: &str, check: &dyn HealthCheck) -> HealthOutcome {
    match catch_unwind(AssertUnwindSafe(|| check.check())) {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(check = name, panic = %message, "Health check panicked");
            HealthOutcome::critical(format!("health check panicked: {message}"))
        }
    }
}
