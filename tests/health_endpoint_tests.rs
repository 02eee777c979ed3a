//! The diagnostic health endpoint over real traffic.

use std::sync::Arc;

use slipway::config::{HealthConfig, PoolConfig, ServerConfig, Thresholds};
use slipway::health::{HealthCheck, HealthOutcome, HealthRegistry};
use slipway::http::health_endpoint;
use slipway::pool::PoolProbe;
use slipway::testing::TestServer;
use slipway::Server;

mod common;

struct Fixed(HealthOutcome);

impl HealthCheck for Fixed {
    fn check(&self) -> HealthOutcome {
        self.0.clone()
    }
}

#[tokio::test]
async fn test_idle_pool_reports_healthy() {
    let (app, _gate) = common::test_router();
    let server = TestServer::start(app).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let body = res.text().await.unwrap();
    assert!(body.contains("* pool-queued-requests: OK"));
    assert!(body.contains("* pool-utilization: OK"));
    assert!(body.lines().all(|line| line.starts_with("* ")));

    server.stop().await;
}

#[tokio::test]
async fn test_unhealthy_check_turns_report_500() {
    let (app, _gate) = common::test_router();
    let server = Server::new(ServerConfig::ephemeral()).router(app).health_check(
        "flaky",
        Arc::new(Fixed(HealthOutcome::warning("intermittent backend"))),
    );
    let server = TestServer::from_server(server).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 500);

    let body = res.text().await.unwrap();
    assert!(body.contains("! flaky: WARNING - intermittent backend\n"));
    assert!(body.contains("* pool-utilization: OK"));

    server.stop().await;
}

#[tokio::test]
async fn test_no_registered_checks_is_501() {
    // Built-in checks off; mount a bare report endpoint over an empty
    // registry as the application.
    let config = ServerConfig {
        health: HealthConfig {
            enabled: false,
            ..HealthConfig::default()
        },
        ..ServerConfig::ephemeral()
    };
    let app = health_endpoint::router("/health", Arc::new(HealthRegistry::new()));
    let server = TestServer::with_config(config, app).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 501);
    assert_eq!(res.text().await.unwrap(), "! No health checks registered.\n");

    server.stop().await;
}

#[tokio::test]
async fn test_endpoint_is_get_only() {
    let (app, _gate) = common::test_router();
    let server = TestServer::start(app).await;

    let client = reqwest::Client::new();
    let res = client.post(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 405);

    server.stop().await;
}

#[tokio::test]
async fn test_disabled_health_removes_endpoint() {
    let (app, _gate) = common::test_router();
    let config = ServerConfig {
        health: HealthConfig {
            enabled: false,
            ..HealthConfig::default()
        },
        ..ServerConfig::ephemeral()
    };
    let server = TestServer::with_config(config, app).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_saturated_pool_crosses_thresholds() {
    let (app, gate) = common::test_router();
    let config = ServerConfig {
        pool: PoolConfig {
            min_workers: 2,
            max_workers: 2,
            ..PoolConfig::default()
        },
        health: HealthConfig {
            utilization: Thresholds {
                warning: 0.5,
                critical: 0.9,
            },
            ..HealthConfig::default()
        },
        ..ServerConfig::ephemeral()
    };
    let server = TestServer::with_config(config, app).await;

    // One busy worker of two sits exactly on the 0.5 warning threshold.
    let held = tokio::spawn(reqwest::get(server.url("/slow")));
    common::wait_until(|| server.handle().pool().snapshot().busy_workers() == 1).await;

    // The health request itself occupies the second worker, pushing
    // utilization to 1.0: past critical.
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(body.contains("! pool-utilization: CRITICAL"));

    gate.open();
    assert_eq!(held.await.unwrap().unwrap().status(), 200);

    // Idle again: healthy.
    common::wait_until(|| server.handle().pool().snapshot().busy_workers() == 0).await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await;
}
