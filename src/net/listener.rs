//! Connector binding and the bounded accept loop.
//!
//! # Responsibilities
//! - Bind each configured connector, resolving ephemeral ports
//! - Accept connections, capped by a semaphore at `max_connections`
//! - Serve each connection via hyper, draining gracefully on shutdown
//!
//! At the connection cap the loop simply stops accepting; excess clients
//! wait in the kernel backlog. This is the transport-level half of
//! admission backpressure (the dispatch queue bound is the other half).

use std::sync::Arc;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ConnectorConfig;
use crate::lifecycle::{ConnectorEndpoint, Shutdown};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// A bound connector, ready to accept connections.
pub struct Connector {
    listener: TcpListener,
    endpoint: ConnectorEndpoint,
    connection_limit: Arc<Semaphore>,
}

impl Connector {
    /// Bind to the configured address.
    ///
    /// Port 0 resolves to an ephemeral port; the returned endpoint always
    /// carries the real one.
    pub async fn bind(config: &ConnectorConfig) -> Result<Self, ListenerError> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|source| {
            ListenerError::Bind {
                addr: addr.clone(),
                source,
            }
        })?;
        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let endpoint = ConnectorEndpoint::new(config.host.clone(), local_addr.port(), "http");

        info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Connector bound"
        );

        Ok(Self {
            listener,
            endpoint,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    pub fn endpoint(&self) -> &ConnectorEndpoint {
        &self.endpoint
    }

    /// Accept and serve connections until shutdown, then drain them.
    pub async fn run(self, app: Router, shutdown: Shutdown) {
        let mut connections = JoinSet::new();

        loop {
            // Respect the connection cap before touching the listener.
            let permit = tokio::select! {
                permit = self.connection_limit.clone().acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    }
                }
                _ = shutdown.wait() => break,
            };

            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "Connection accepted");
                            let app = app.clone();
                            let shutdown = shutdown.clone();
                            connections.spawn(async move {
                                let _permit = permit;
                                serve_connection(stream, app, shutdown).await;
                            });
                        }
                        Err(error) => {
                            warn!(%error, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown.wait() => break,
            }
        }

        // In-flight connections get their graceful-shutdown signal through
        // the same broadcast; wait for them here.
        while connections.join_next().await.is_some() {}
        info!(endpoint = %self.endpoint, "Connector stopped");
    }
}

async fn serve_connection(stream: TcpStream, app: Router, shutdown: Shutdown) {
    let io = TokioIo::new(stream);
    let service = TowerToHyperService::new(app);
    let builder = auto::Builder::new(TokioExecutor::new());

    let connection = builder.serve_connection(io, service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => {
            if let Err(error) = result {
                debug!(%error, "Connection closed with error");
            }
        }
        _ = shutdown.wait() => {
            connection.as_mut().graceful_shutdown();
            if let Err(error) = connection.as_mut().await {
                debug!(%error, "Connection closed with error during shutdown");
            }
        }
    }
}
