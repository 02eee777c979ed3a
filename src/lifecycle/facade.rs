//! The running-server facade.
//!
//! [`ServerHandle`] holds the resolved listening endpoints and a minimal
//! read/control surface: enumerate connectors, build client URLs, stop. The
//! singular accessors refuse to guess when more than one connector exists.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};
use url::Url;

use crate::health::HealthRegistry;
use crate::lifecycle::Shutdown;
use crate::pool::DispatchPool;

/// A resolved listening endpoint. Immutable once the server starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorEndpoint {
    host: String,
    port: u16,
    protocol: String,
}

impl ConnectorEndpoint {
    pub fn new(host: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: protocol.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Build a client URL for this endpoint with the given mount path.
    ///
    /// Unspecified bind hosts render as `localhost` so the URL is dialable.
    pub fn url(&self, context: &str) -> Url {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost",
            host => host,
        };
        let path = if context == "/" { "" } else { context };
        Url::parse(&format!("{}://{}:{}{}", self.protocol, host, self.port, path)).unwrap()
    }
}

impl fmt::Display for ConnectorEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Error from the facade's contract checks.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A singular accessor was used while the server exposes zero or
    /// several connectors.
    #[error("expected exactly one connector, found {actual}")]
    ConnectorCountMismatch { actual: usize },
}

fn exactly_one(endpoints: &[ConnectorEndpoint]) -> Result<&ConnectorEndpoint, LifecycleError> {
    match endpoints {
        [endpoint] => Ok(endpoint),
        other => Err(LifecycleError::ConnectorCountMismatch {
            actual: other.len(),
        }),
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    endpoints: Vec<ConnectorEndpoint>,
    context: String,
    registry: Arc<HealthRegistry>,
    pool: DispatchPool,
    shutdown: Shutdown,
    tasks: JoinSet<()>,
    grace: Duration,
}

impl ServerHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        endpoints: Vec<ConnectorEndpoint>,
        context: String,
        registry: Arc<HealthRegistry>,
        pool: DispatchPool,
        shutdown: Shutdown,
        tasks: JoinSet<()>,
        grace: Duration,
    ) -> Self {
        Self {
            endpoints,
            context,
            registry,
            pool,
            shutdown,
            tasks,
            grace,
        }
    }

    /// All listening endpoints. Never fails.
    pub fn connectors(&self) -> &[ConnectorEndpoint] {
        &self.endpoints
    }

    pub fn connectors_count(&self) -> usize {
        self.endpoints.len()
    }

    /// The single listening endpoint.
    ///
    /// Fails rather than silently picking one when the connector count is
    /// not exactly one.
    pub fn connector(&self) -> Result<&ConnectorEndpoint, LifecycleError> {
        exactly_one(&self.endpoints)
    }

    /// Client URLs for every connector, with the context path applied.
    pub fn urls(&self) -> Vec<Url> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.url(&self.context))
            .collect()
    }

    /// Client URL for the single connector; fails like [`Self::connector`].
    pub fn url(&self) -> Result<Url, LifecycleError> {
        self.connector().map(|endpoint| endpoint.url(&self.context))
    }

    /// The normalized mount path of the application.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The health registry serving the diagnostic endpoint.
    pub fn health(&self) -> &HealthRegistry {
        &self.registry
    }

    /// The dispatch pool, for gauge introspection.
    pub fn pool(&self) -> &DispatchPool {
        &self.pool
    }

    /// A shutdown trigger usable from other tasks.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Stop the server: reject new work, drain in-flight connections and
    /// the pool within the grace period, then force whatever remains.
    pub async fn stop(mut self) {
        info!("Server stopping");
        self.shutdown.trigger();
        self.pool.close();

        let deadline = tokio::time::Instant::now() + self.grace;

        let mut tasks = std::mem::replace(&mut self.tasks, JoinSet::new());
        let drained = tokio::time::timeout_at(deadline, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("Connections did not drain within the grace period; aborting");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if !self.pool.drained(remaining).await {
            warn!("Dispatch pool did not drain within the grace period");
        }
        info!("Server stopped");
    }
}
