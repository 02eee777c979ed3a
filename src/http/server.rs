//! Server assembly.
//!
//! # Responsibilities
//! - Collect the application router, scope items, and health checks
//! - Mount the application under the configured context path
//! - Wire up middleware (CORS filters, timeout, tracing, request scope,
//!   request timer, pool dispatch)
//! - Merge the diagnostic health endpoint
//!
//! The middleware stack, outermost first: CORS filters in ascending `order`,
//! request timeout, trace, request scope (transaction id), request timer,
//! pool dispatch, handlers. Everything behind dispatch runs on the pool,
//! the health endpoint included.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::health::{HealthCheck, HealthRegistry};
use crate::http::cors::{self, CorsBuildError};
use crate::http::health_endpoint;
use crate::lifecycle::startup::{self, StartupError};
use crate::lifecycle::ServerHandle;
use crate::observability::RequestTimerLayer;
use crate::pool::{DispatchLayer, DispatchPool};
use crate::scope::{RequestScope, RequestScopeLayer, ScopeItem};

/// Builder for an embedded server.
///
/// Collects the application router plus any extra scope items and health
/// checks, then [`Server::start`] binds the connectors and returns the
/// running server's handle.
pub struct Server {
    pub(crate) config: ServerConfig,
    pub(crate) app: Router,
    pub(crate) scope_items: Vec<(String, Arc<dyn ScopeItem>)>,
    pub(crate) health_checks: Vec<(String, Arc<dyn HealthCheck>)>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            app: Router::new(),
            scope_items: Vec::new(),
            health_checks: Vec::new(),
        }
    }

    /// Set the application router mounted under the context path.
    pub fn router(mut self, app: Router) -> Self {
        self.app = app;
        self
    }

    /// Register a named scope item, invoked around every request after the
    /// built-in transaction item.
    pub fn scope_item(mut self, name: impl Into<String>, item: Arc<dyn ScopeItem>) -> Self {
        self.scope_items.push((name.into(), item));
        self
    }

    /// Register a named health check alongside the built-in pool checks.
    pub fn health_check(mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push((name.into(), check));
        self
    }

    /// Validate the config, start the pool, bind every connector, and begin
    /// serving. Any failure aborts before a socket accepts traffic.
    pub async fn start(self) -> Result<ServerHandle, StartupError> {
        startup::start(self).await
    }
}

/// Assemble the full middleware stack around the application router.
pub(crate) fn assemble(
    config: &ServerConfig,
    app: Router,
    scope: RequestScope,
    registry: Arc<HealthRegistry>,
    pool: DispatchPool,
) -> Result<Router, CorsBuildError> {
    let context = config.context.normalized();
    let mut router = if context == "/" {
        app
    } else {
        Router::new().nest(&context, app)
    };

    if config.health.enabled {
        router = router.merge(health_endpoint::router(&config.health.path, registry));
    }

    let mut router = router
        .layer(DispatchLayer::new(pool))
        .layer(RequestTimerLayer)
        .layer(RequestScopeLayer::new(scope))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )));

    // Later `.layer` calls wrap earlier ones, so applying in descending
    // `order` leaves the lowest order outermost, running first.
    let mut filters: Vec<_> = config.cors.iter().collect();
    filters.sort_by_key(|filter| filter.order);
    for filter in filters.into_iter().rev() {
        router = router.layer(cors::build_scoped_layer(filter)?);
    }

    Ok(router)
}
