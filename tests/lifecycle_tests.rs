//! Lifecycle facade behavior: endpoints, URLs, stop.

use slipway::config::{ConnectorConfig, ContextConfig, ServerConfig};
use slipway::lifecycle::LifecycleError;
use slipway::testing::TestServer;
use slipway::Server;

mod common;

fn ephemeral_connector() -> ConnectorConfig {
    ConnectorConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ConnectorConfig::default()
    }
}

#[tokio::test]
async fn test_ephemeral_port_is_resolved() {
    let (app, _gate) = common::test_router();
    let server = TestServer::start(app).await;

    let connector = server.handle().connector().unwrap();
    assert_ne!(connector.port(), 0);
    assert_eq!(connector.protocol(), "http");

    let url = server.handle().url().unwrap();
    assert_eq!(url.port(), Some(connector.port()));

    server.stop().await;
}

#[tokio::test]
async fn test_singular_accessors_fail_with_two_connectors() {
    let (app, _gate) = common::test_router();
    let config = ServerConfig {
        connectors: vec![ephemeral_connector(), ephemeral_connector()],
        ..ServerConfig::ephemeral()
    };
    let server = TestServer::with_config(config, app).await;

    let handle = server.handle();
    assert_eq!(handle.connectors_count(), 2);
    assert_eq!(handle.urls().len(), 2);
    assert!(matches!(
        handle.connector(),
        Err(LifecycleError::ConnectorCountMismatch { actual: 2 })
    ));
    assert!(matches!(
        handle.url(),
        Err(LifecycleError::ConnectorCountMismatch { actual: 2 })
    ));

    // The plural accessors serve both endpoints.
    for url in handle.urls() {
        let res = reqwest::get(format!("{url}ok")).await.unwrap();
        assert_eq!(res.status(), 200);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_urls_carry_context_path() {
    let (app, _gate) = common::test_router();
    let config = ServerConfig {
        context: ContextConfig("app".to_string()),
        ..ServerConfig::ephemeral()
    };
    let server = TestServer::with_config(config, app).await;

    let url = server.handle().url().unwrap();
    assert!(url.as_str().ends_with("/app"));
    assert_eq!(server.handle().context(), "/app");

    server.stop().await;
}

#[tokio::test]
async fn test_stop_releases_the_port() {
    let (app, _gate) = common::test_router();
    let server = TestServer::start(app).await;
    let url = server.url("/ok");

    assert_eq!(reqwest::get(&url).await.unwrap().status(), 200);

    server.stop().await;

    let client = reqwest::Client::new();
    assert!(client.get(&url).send().await.is_err());
}

#[tokio::test]
async fn test_invalid_config_fails_startup() {
    // No connectors configured.
    let result = Server::new(ServerConfig::default()).start().await;
    let error = result.err().expect("startup must fail");
    assert!(error.to_string().contains("at least one connector"));
}

#[tokio::test]
async fn test_inverted_pool_bounds_fail_startup() {
    let mut config = ServerConfig::ephemeral();
    config.pool.min_workers = 8;
    config.pool.max_workers = 2;

    let result = Server::new(config).start().await;
    assert!(result.is_err());
}
