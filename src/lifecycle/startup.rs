//! Startup orchestration.
//!
//! Fail fast: any error here is fatal and nothing accepts traffic.
//! Subsystems initialize in dependency order — config validation, metrics
//! exposition, dispatch pool, request scope, health registry, router
//! assembly — and the connectors bind last, so traffic only arrives once
//! everything behind it is ready.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::info;

use crate::config::{validate_config, ConfigError};
use crate::health::pool::{QUEUED_REQUESTS_CHECK, UTILIZATION_CHECK};
use crate::health::{HealthRegistry, PoolUtilizationCheck, QueuedRequestsCheck};
use crate::http::cors::CorsBuildError;
use crate::http::server::{assemble, Server};
use crate::lifecycle::{ServerHandle, Shutdown};
use crate::net::{Connector, ListenerError};
use crate::observability::metrics;
use crate::pool::{DispatchPool, PoolProbe};
use crate::scope::{RequestScope, ScopeItem, TransactionIdItem};

/// Error aborting server startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Cors(#[from] CorsBuildError),
}

pub(crate) async fn start(server: Server) -> Result<ServerHandle, StartupError> {
    let Server {
        config,
        app,
        scope_items,
        health_checks,
    } = server;

    validate_config(&config).map_err(ConfigError::Validation)?;

    if config.observability.metrics_enabled {
        // The address was validated with the rest of the config.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let pool = DispatchPool::new(config.pool);
    pool.start();

    let mut items: Vec<(String, Arc<dyn ScopeItem>)> =
        vec![("transaction".to_string(), Arc::new(TransactionIdItem))];
    items.extend(scope_items);
    let scope = RequestScope::new(items);

    let mut registry = HealthRegistry::new();
    if config.health.enabled {
        let probe: Arc<dyn PoolProbe> = Arc::new(pool.clone());
        registry.register(
            UTILIZATION_CHECK,
            Arc::new(PoolUtilizationCheck::new(
                probe.clone(),
                config.health.utilization,
            )),
        );
        registry.register(
            QUEUED_REQUESTS_CHECK,
            Arc::new(QueuedRequestsCheck::new(probe, config.health.queued_requests)),
        );
    }
    for (name, check) in health_checks {
        registry.register(name, check);
    }
    let registry = Arc::new(registry);

    let app = assemble(&config, app, scope, registry.clone(), pool.clone())?;

    let shutdown = Shutdown::new();
    let mut endpoints = Vec::new();
    let mut tasks = JoinSet::new();
    for connector_config in &config.connectors {
        let connector = Connector::bind(connector_config).await?;
        endpoints.push(connector.endpoint().clone());
        tasks.spawn(connector.run(app.clone(), shutdown.clone()));
    }

    let handle = ServerHandle::new(
        endpoints,
        config.context.normalized(),
        registry,
        pool,
        shutdown,
        tasks,
        Duration::from_secs(config.shutdown.grace_secs),
    );

    for url in handle.urls() {
        info!(%url, "Server started");
    }

    Ok(handle)
}
