//! Configuration validation.
//!
//! Semantic validation on top of what serde already guarantees
//! syntactically. Validation is a pure function over the config, runs before
//! the config is accepted into the system, and returns all violations rather
//! than stopping at the first.

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::{CorsConfig, ServerConfig};

/// A single semantic violation in a config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("at least one connector must be configured")]
    NoConnectors,

    #[error("pool.max_workers must be greater than zero")]
    ZeroMaxWorkers,

    #[error("pool.min_workers ({min}) must not exceed pool.max_workers ({max})")]
    PoolBoundsInverted { min: usize, max: usize },

    #[error("pool.max_queued_requests must be greater than zero")]
    ZeroQueueBound,

    #[error("{scope} warning threshold ({warning}) must not exceed critical ({critical})")]
    ThresholdsInverted {
        scope: &'static str,
        warning: f64,
        critical: f64,
    },

    #[error("health.utilization thresholds must not be negative")]
    NegativeUtilizationThreshold,

    #[error("health.path must start with '/': {0:?}")]
    BadHealthPath(String),

    #[error("cors[{index}].allowed_origins entry {value:?} is not a valid origin")]
    BadCorsOrigin { index: usize, value: String },

    #[error("cors[{index}].allowed_methods entry {value:?} is not a valid HTTP method")]
    BadCorsMethod { index: usize, value: String },

    #[error("cors[{index}].allowed_headers entry {value:?} is not a valid header name")]
    BadCorsHeader { index: usize, value: String },

    #[error("cors[{index}].exposed_headers entry {value:?} is not a valid header name")]
    BadCorsExposedHeader { index: usize, value: String },

    #[error("cors[{index}].url_patterns entry {value:?} is not a valid path pattern")]
    BadCorsPattern { index: usize, value: String },

    #[error("cors[{index}].url_patterns must not be empty")]
    EmptyCorsPatterns { index: usize },

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    BadMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate a config, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.connectors.is_empty() {
        errors.push(ValidationError::NoConnectors);
    }

    let pool = &config.pool;
    if pool.max_workers == 0 {
        errors.push(ValidationError::ZeroMaxWorkers);
    }
    if pool.min_workers > pool.max_workers {
        errors.push(ValidationError::PoolBoundsInverted {
            min: pool.min_workers,
            max: pool.max_workers,
        });
    }
    if pool.max_queued_requests == 0 {
        errors.push(ValidationError::ZeroQueueBound);
    }

    let health = &config.health;
    if health.utilization.warning < 0.0 || health.utilization.critical < 0.0 {
        errors.push(ValidationError::NegativeUtilizationThreshold);
    }
    if health.utilization.warning > health.utilization.critical {
        errors.push(ValidationError::ThresholdsInverted {
            scope: "health.utilization",
            warning: health.utilization.warning,
            critical: health.utilization.critical,
        });
    }
    if health.queued_requests.warning > health.queued_requests.critical {
        errors.push(ValidationError::ThresholdsInverted {
            scope: "health.queued_requests",
            warning: health.queued_requests.warning as f64,
            critical: health.queued_requests.critical as f64,
        });
    }
    if !health.path.starts_with('/') {
        errors.push(ValidationError::BadHealthPath(health.path.clone()));
    }

    for (index, cors) in config.cors.iter().enumerate() {
        validate_cors(index, cors, &mut errors);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cors(index: usize, cors: &CorsConfig, errors: &mut Vec<ValidationError>) {
    if cors.allowed_origins.trim() != "*" {
        for origin in split_list(&cors.allowed_origins) {
            if HeaderValue::from_str(origin).is_err() {
                errors.push(ValidationError::BadCorsOrigin {
                    index,
                    value: origin.to_string(),
                });
            }
        }
    }

    for method in split_list(&cors.allowed_methods) {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::BadCorsMethod {
                index,
                value: method.to_string(),
            });
        }
    }

    for header in split_list(&cors.allowed_headers) {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::BadCorsHeader {
                index,
                value: header.to_string(),
            });
        }
    }

    for header in split_list(&cors.exposed_headers) {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::BadCorsExposedHeader {
                index,
                value: header.to_string(),
            });
        }
    }

    if cors.url_patterns.is_empty() {
        errors.push(ValidationError::EmptyCorsPatterns { index });
    }
    for pattern in &cors.url_patterns {
        // Servlet-style patterns: "/", "/*", exact "/path", prefix "/path/*",
        // or suffix "*.ext". Anything else is rejected up front.
        let valid = pattern == "/"
            || pattern == "/*"
            || (pattern.starts_with("*.") && pattern.len() > 2)
            || (pattern.starts_with('/') && !pattern.contains("**"));
        if !valid {
            errors.push(ValidationError::BadCorsPattern {
                index,
                value: pattern.clone(),
            });
        }
    }
}

/// Split a comma-separated config list, dropping empty entries.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ConnectorConfig;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            connectors: vec![ConnectorConfig::default()],
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_config_requires_connector() {
        let errors = validate_config(&ServerConfig::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::NoConnectors)));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut config = valid_config();
        config.pool.min_workers = 10;
        config.pool.max_workers = 2;
        config.pool.max_queued_requests = 0;
        config.health.utilization.warning = 0.9;
        config.health.utilization.critical = 0.5;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 4, "expected every violation, got {errors:?}");
    }

    #[test]
    fn test_cors_entries_checked() {
        let mut config = valid_config();
        config.cors.push(CorsConfig {
            allowed_origins: "https://ok.example, not a origin\u{7f}".to_string(),
            allowed_methods: "GET,FL OSS".to_string(),
            url_patterns: vec!["no-slash".to_string()],
            ..CorsConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BadCorsOrigin { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BadCorsMethod { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BadCorsPattern { .. })));
    }

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        let parts: Vec<&str> = split_list(" GET , POST ,, HEAD ").collect();
        assert_eq!(parts, vec!["GET", "POST", "HEAD"]);
    }
}
