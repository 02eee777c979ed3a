//! Ephemeral server helpers for tests.
//!
//! Spins up a full server on an ephemeral loopback port and hands back
//! resolved URLs, so tests drive the real middleware stack over real
//! sockets and still run in parallel without port collisions.

use axum::Router;

use crate::config::ServerConfig;
use crate::http::Server;
use crate::lifecycle::ServerHandle;

/// A server bound to an ephemeral port for the duration of a test.
pub struct TestServer {
    handle: ServerHandle,
}

impl TestServer {
    /// Start with defaults: one loopback connector on port 0, metrics
    /// exposition off.
    pub async fn start(app: Router) -> Self {
        Self::with_config(ServerConfig::ephemeral(), app).await
    }

    /// Start with a custom config (connector ports may stay 0).
    pub async fn with_config(config: ServerConfig, app: Router) -> Self {
        Self::from_server(Server::new(config).router(app)).await
    }

    /// Start from a fully prepared builder, for tests registering extra
    /// scope items or health checks.
    pub async fn from_server(server: Server) -> Self {
        let handle = server.start().await.expect("test server failed to start");
        Self { handle }
    }

    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    /// A client URL for `path` on the first connector.
    pub fn url(&self, path: &str) -> String {
        let endpoint = &self.handle.connectors()[0];
        format!("http://{}:{}{}", endpoint.host(), endpoint.port(), path)
    }

    pub async fn stop(self) {
        self.handle.stop().await;
    }
}
