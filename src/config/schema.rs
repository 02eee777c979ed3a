//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server
//! harness. All types derive Serde traits for deserialization from config
//! files, and every field carries a default so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for an embedded server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening endpoints. At least one is required.
    pub connectors: Vec<ConnectorConfig>,

    /// Mount path for the application router.
    ///
    /// Normalized to always carry a leading slash and no trailing slash;
    /// `"/"` mounts at the root.
    pub context: ContextConfig,

    /// Dispatch pool sizing.
    pub pool: PoolConfig,

    /// CORS filters, applied in ascending `order`.
    pub cors: Vec<CorsConfig>,

    /// Health checks and the diagnostic endpoint.
    pub health: HealthConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Shutdown behavior.
    pub shutdown: ShutdownConfig,
}

impl ServerConfig {
    /// A config with a single ephemeral connector on the loopback interface.
    ///
    /// Used by the test helpers; the real port is resolved at bind time.
    pub fn ephemeral() -> Self {
        Self {
            connectors: vec![ConnectorConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                ..ConnectorConfig::default()
            }],
            observability: ObservabilityConfig {
                metrics_enabled: false,
                ..ObservabilityConfig::default()
            },
            ..Self::default()
        }
    }
}

/// A single listening endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Bind host (e.g., "0.0.0.0" or "127.0.0.1").
    pub host: String,

    /// Bind port. Port 0 requests an ephemeral port.
    pub port: u16,

    /// Maximum concurrent connections on this connector (backpressure).
    pub max_connections: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 10_000,
        }
    }
}

/// Application mount path.
///
/// Stored as written in the config file; [`ContextConfig::normalized`]
/// produces the canonical form used when assembling the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContextConfig(pub String);

impl Default for ContextConfig {
    fn default() -> Self {
        Self("/".to_string())
    }
}

impl ContextConfig {
    /// Canonical mount path: leading slash, no trailing slash.
    ///
    /// `""` and `"/"` both normalize to `"/"`; `"app/"` becomes `"/app"`.
    pub fn normalized(&self) -> String {
        let trimmed = self.0.trim();
        let mut path = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        while path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        path
    }
}

/// Dispatch pool sizing.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Workers started with the pool and kept alive while it runs.
    pub min_workers: usize,

    /// Upper bound on concurrent workers.
    pub max_workers: usize,

    /// Seconds an idle surplus worker waits for work before retiring.
    pub idle_timeout_secs: u64,

    /// Queue depth limit; submissions beyond it are rejected.
    pub max_queued_requests: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 4,
            max_workers: 64,
            idle_timeout_secs: 60,
            max_queued_requests: 1024,
        }
    }
}

/// A CORS filter definition.
///
/// Origin, method, and header lists use the comma-separated string form of
/// the original filter config. `"*"` for origins allows any origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Comma-separated origins, or "*" for any.
    pub allowed_origins: String,

    /// Comma-separated methods allowed on cross-origin requests.
    pub allowed_methods: String,

    /// Comma-separated request headers allowed on cross-origin requests.
    pub allowed_headers: String,

    /// Seconds a preflight response may be cached by the browser.
    pub preflight_max_age_secs: u64,

    /// Whether credentialed requests are allowed.
    pub allow_credentials: bool,

    /// Comma-separated response headers exposed to the browser.
    pub exposed_headers: String,

    /// Whether preflight requests continue down the handler chain.
    ///
    /// The filter terminates preflight itself; disabling this is accepted
    /// for config compatibility and logged at startup.
    pub chain_preflight: bool,

    /// Servlet-style path patterns this filter applies to.
    pub url_patterns: Vec<String>,

    /// Relative application order among CORS filters (ascending).
    pub order: i32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_string(),
            allowed_methods: "GET,POST,HEAD".to_string(),
            allowed_headers: "X-Requested-With,Content-Type,Accept,Origin".to_string(),
            preflight_max_age_secs: 1800,
            allow_credentials: true,
            exposed_headers: String::new(),
            chain_preflight: true,
            url_patterns: vec!["/*".to_string()],
            order: 0,
        }
    }
}

/// Health check settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable the diagnostic endpoint and the built-in pool checks.
    pub enabled: bool,

    /// Path the diagnostic endpoint is served at.
    pub path: String,

    /// Thresholds for the pool utilization check.
    pub utilization: Thresholds<f64>,

    /// Thresholds for the queued request count check.
    pub queued_requests: Thresholds<usize>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/health".to_string(),
            utilization: Thresholds {
                warning: 0.75,
                critical: 0.9,
            },
            queued_requests: Thresholds {
                warning: 16,
                critical: 64,
            },
        }
    }
}

/// A warning/critical threshold pair.
///
/// Reaching a threshold enters that band: `value >= critical` classifies as
/// critical, otherwise `value >= warning` as warning.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Thresholds<T> {
    pub warning: T,
    pub critical: T,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exposition listener.
    pub metrics_enabled: bool,

    /// Exposition listener bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds in-flight work is given to finish before being aborted.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_normalization() {
        assert_eq!(ContextConfig("/".into()).normalized(), "/");
        assert_eq!(ContextConfig("".into()).normalized(), "/");
        assert_eq!(ContextConfig("app".into()).normalized(), "/app");
        assert_eq!(ContextConfig("/app".into()).normalized(), "/app");
        assert_eq!(ContextConfig("/app/".into()).normalized(), "/app");
        assert_eq!(ContextConfig("app///".into()).normalized(), "/app");
        assert_eq!(ContextConfig("/a/b/".into()).normalized(), "/a/b");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert!(config.connectors.is_empty());
        assert_eq!(config.context.normalized(), "/");
        assert_eq!(config.pool.min_workers, 4);
        assert_eq!(config.pool.max_workers, 64);
        assert_eq!(config.pool.max_queued_requests, 1024);
        assert!(config.health.enabled);
        assert_eq!(config.health.path, "/health");
        assert_eq!(config.shutdown.grace_secs, 10);
    }

    #[test]
    fn test_cors_defaults() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allowed_origins, "*");
        assert_eq!(cors.allowed_methods, "GET,POST,HEAD");
        assert_eq!(
            cors.allowed_headers,
            "X-Requested-With,Content-Type,Accept,Origin"
        );
        assert_eq!(cors.preflight_max_age_secs, 1800);
        assert!(cors.allow_credentials);
        assert!(cors.chain_preflight);
        assert_eq!(cors.url_patterns, vec!["/*"]);
        assert_eq!(cors.order, 0);
    }

    #[test]
    fn test_toml_sections_parse() {
        let toml = r#"
            context = "api/"

            [[connectors]]
            host = "0.0.0.0"
            port = 9000

            [pool]
            min_workers = 2
            max_workers = 8

            [[cors]]
            allowed_origins = "https://example.com"
            url_patterns = ["/api/*"]
            order = 5

            [health.utilization]
            warning = 0.5
            critical = 0.8
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.context.normalized(), "/api");
        assert_eq!(config.connectors[0].port, 9000);
        assert_eq!(config.connectors[0].max_connections, 10_000);
        assert_eq!(config.pool.max_workers, 8);
        assert_eq!(config.cors[0].order, 5);
        assert_eq!(config.health.utilization.warning, 0.5);
        assert_eq!(config.health.queued_requests.critical, 64);
    }
}
