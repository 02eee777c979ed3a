//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ServerConfig (validated, immutable)
//!     → consumed by startup; never reloaded at runtime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ConnectorConfig, ContextConfig, CorsConfig, HealthConfig, ObservabilityConfig, PoolConfig,
    ServerConfig, ShutdownConfig, Thresholds, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
