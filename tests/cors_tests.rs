//! CORS filter behavior over real traffic.

use axum::routing::get;
use axum::Router;
use slipway::config::{CorsConfig, ServerConfig};
use slipway::testing::TestServer;

mod common;

fn config_with(cors: Vec<CorsConfig>) -> ServerConfig {
    ServerConfig {
        cors,
        ..ServerConfig::ephemeral()
    }
}

#[tokio::test]
async fn test_literal_origin_is_echoed() {
    let (app, _gate) = common::test_router();
    let config = config_with(vec![CorsConfig {
        allowed_origins: "https://example.com".to_string(),
        ..CorsConfig::default()
    }]);
    let server = TestServer::with_config(config, app).await;

    let client = reqwest::Client::new();
    let res = client
        .get(server.url("/ok"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "https://example.com"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_mismatched_origin_gets_no_header() {
    let (app, _gate) = common::test_router();
    let config = config_with(vec![CorsConfig {
        allowed_origins: "https://example.com".to_string(),
        ..CorsConfig::default()
    }]);
    let server = TestServer::with_config(config, app).await;

    let client = reqwest::Client::new();
    let res = client
        .get(server.url("/ok"))
        .header("Origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("access-control-allow-origin").is_none());

    server.stop().await;
}

#[tokio::test]
async fn test_out_of_scope_path_bypasses_filter() {
    let app = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/api/data", get(|| async { "data" }));
    let config = config_with(vec![CorsConfig {
        allowed_origins: "https://example.com".to_string(),
        url_patterns: vec!["/api/*".to_string()],
        ..CorsConfig::default()
    }]);
    let server = TestServer::with_config(config, app).await;

    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/data"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_some());

    let res = client
        .get(server.url("/ok"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());

    server.stop().await;
}

#[tokio::test]
async fn test_preflight_carries_methods_and_max_age() {
    let (app, _gate) = common::test_router();
    let config = config_with(vec![CorsConfig {
        allowed_origins: "https://example.com".to_string(),
        ..CorsConfig::default()
    }]);
    let server = TestServer::with_config(config, app).await;

    let client = reqwest::Client::new();
    let res = client
        .request(reqwest::Method::OPTIONS, server.url("/ok"))
        .header("Origin", "https://example.com")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());

    let headers = res.headers();
    let methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("POST"));
    assert!(methods.contains("HEAD"));
    assert_eq!(
        headers.get("access-control-max-age").unwrap().to_str().unwrap(),
        "1800"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_wildcard_with_credentials_echoes_origin() {
    let (app, _gate) = common::test_router();
    let server = TestServer::with_config(config_with(vec![CorsConfig::default()]), app).await;

    let client = reqwest::Client::new();
    let res = client
        .get(server.url("/ok"))
        .header("Origin", "https://anywhere.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "https://anywhere.example"
    );
    assert_eq!(
        res.headers()
            .get("access-control-allow-credentials")
            .unwrap()
            .to_str()
            .unwrap(),
        "true"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_filters_apply_by_pattern_order() {
    let app = Router::new()
        .route("/api/data", get(|| async { "data" }))
        .route("/public/info", get(|| async { "info" }));
    let config = config_with(vec![
        CorsConfig {
            allowed_origins: "https://internal.example".to_string(),
            url_patterns: vec!["/api/*".to_string()],
            order: 1,
            ..CorsConfig::default()
        },
        CorsConfig {
            allowed_origins: "https://public.example".to_string(),
            url_patterns: vec!["/public/*".to_string()],
            order: 0,
            ..CorsConfig::default()
        },
    ]);
    let server = TestServer::with_config(config, app).await;

    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/data"))
        .header("Origin", "https://internal.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "https://internal.example"
    );

    let res = client
        .get(server.url("/public/info"))
        .header("Origin", "https://public.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "https://public.example"
    );

    server.stop().await;
}
