//! Health check results.

use std::fmt;

/// Tri-level health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Ok => f.write_str("OK"),
            HealthStatus::Warning => f.write_str("WARNING"),
            HealthStatus::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// The result of one health check invocation.
///
/// Computed fresh on every run, never persisted. A failing check carries the
/// failure's details for diagnostics instead of propagating it.
#[derive(Debug, Clone)]
pub struct HealthOutcome {
    status: HealthStatus,
    message: Option<String>,
    detail: Option<String>,
}

impl HealthOutcome {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
            message: None,
            detail: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            message: Some(message.into()),
            detail: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Warning,
            message: Some(message.into()),
            detail: None,
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Critical,
            message: Some(message.into()),
            detail: None,
        }
    }

    /// A critical outcome capturing an error and its source chain.
    pub fn failed(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut detail = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            detail.push_str(&format!("\ncaused by: {cause}"));
            source = cause.source();
        }
        Self {
            status: HealthStatus::Critical,
            message: Some(error.to_string()),
            detail: Some(detail),
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Failure details (message plus cause chain), when the outcome captured
    /// an error.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Inner;

    #[derive(Debug, Error)]
    #[error("probe failed")]
    struct Outer(#[source] Inner);

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Ok.to_string(), "OK");
        assert_eq!(HealthStatus::Warning.to_string(), "WARNING");
        assert_eq!(HealthStatus::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_only_ok_is_healthy() {
        assert!(HealthOutcome::ok().is_healthy());
        assert!(!HealthOutcome::warning("w").is_healthy());
        assert!(!HealthOutcome::critical("c").is_healthy());
    }

    #[test]
    fn test_failed_captures_cause_chain() {
        let outcome = HealthOutcome::failed(&Outer(Inner));
        assert_eq!(outcome.status(), HealthStatus::Critical);
        assert_eq!(outcome.message(), Some("probe failed"));
        let detail = outcome.detail().unwrap();
        assert!(detail.contains("probe failed"));
        assert!(detail.contains("caused by: connection refused"));
    }
}
