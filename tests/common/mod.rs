//! Shared fixtures for integration tests.

use std::time::Duration;

use axum::routing::get;
use axum::{Extension, Router};
use tokio::sync::watch;

use slipway::scope::TransactionId;

/// A gate holding `/slow` handlers open until released.
pub struct Gate {
    tx: watch::Sender<bool>,
}

impl Gate {
    #[allow(dead_code)]
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }
}

/// The standard test application: `/ok`, `/boom` (panics), `/whoami`
/// (echoes the transaction id), and `/slow` (blocks until the gate opens).
pub fn test_router() -> (Router, Gate) {
    let (tx, rx) = watch::channel(false);

    let router = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route(
            "/boom",
            get(|| async {
                panic!("handler exploded");
                #[allow(unreachable_code)]
                ""
            }),
        )
        .route(
            "/whoami",
            get(|Extension(txn): Extension<TransactionId>| async move { txn.to_string() }),
        )
        .route(
            "/slow",
            get(move || {
                let mut rx = rx.clone();
                async move {
                    let _ = rx.wait_for(|open| *open).await;
                    "released"
                }
            }),
        );

    (router, Gate { tx })
}

/// Poll until `condition` holds, failing the test after one second.
#[allow(dead_code)]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached within 1s");
}
