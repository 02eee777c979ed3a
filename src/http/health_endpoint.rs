//! The plain-text health report endpoint.
//!
//! GET-only. One line per check, sorted by name:
//!
//! ```text
//! * ready: OK
//! ! pool-utilization: CRITICAL - utilization 0.95, 19 of 20 workers busy
//! ```
//!
//! HTTP 200 when every check is OK, 500 when any is not, and 501 with
//! `! No health checks registered.` when the registry is empty.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::health::{HealthOutcome, HealthRegistry};

/// Router serving the health report at `path`.
pub fn router(path: &str, registry: Arc<HealthRegistry>) -> Router {
    Router::new()
        .route(path, get(health_report))
        .with_state(registry)
}

async fn health_report(State(registry): State<Arc<HealthRegistry>>) -> Response {
    let (status, body) = render_report(registry.run_all());
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Render check results into the report body and its HTTP status.
pub fn render_report(mut results: Vec<(String, HealthOutcome)>) -> (StatusCode, String) {
    if results.is_empty() {
        return (
            StatusCode::NOT_IMPLEMENTED,
            "! No health checks registered.\n".to_string(),
        );
    }

    results.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut body = String::new();
    let mut all_healthy = true;
    for (name, outcome) in &results {
        if outcome.is_healthy() {
            body.push_str(&format!("* {name}: OK"));
            if let Some(message) = outcome.message() {
                body.push_str(&format!(" - {message}"));
            }
            body.push('\n');
        } else {
            all_healthy = false;
            let message = outcome.message().unwrap_or("unavailable");
            body.push_str(&format!("! {name}: {} - {message}\n", outcome.status()));
            if let Some(detail) = outcome.detail() {
                for line in detail.lines() {
                    body.push_str(&format!("    {line}\n"));
                }
            }
        }
    }

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, body)
}
