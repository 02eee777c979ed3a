//! Request timing instrumentation.
//!
//! One timing context per request, recorded exactly once. The context is an
//! owned value: completing a timing that was never started cannot be
//! expressed, and a timing abandoned on an error or cancellation path
//! records itself when dropped, so every request contributes exactly one
//! observation to the `request-timer` histogram.

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::observability::metrics;

/// An in-flight request timing.
#[derive(Debug)]
pub struct RequestTiming {
    started_at: Instant,
    recorded: bool,
}

impl RequestTiming {
    /// Begin timing a request.
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timing and record the elapsed duration.
    pub fn complete(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started_at.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics::record_request_time(elapsed);
        }
        elapsed
    }
}

impl Drop for RequestTiming {
    fn drop(&mut self) {
        if !self.recorded {
            self.record();
        }
    }
}

/// Layer applying [`RequestTimer`] around a service.
#[derive(Clone, Copy, Default)]
pub struct RequestTimerLayer;

impl<S> Layer<S> for RequestTimerLayer {
    type Service = RequestTimer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimer { inner }
    }
}

/// Middleware timing every request it passes through.
#[derive(Clone)]
pub struct RequestTimer<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestTimer<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let timing = RequestTiming::start();
        let future = self.inner.call(request);
        Box::pin(async move {
            let result = future.await;
            timing.complete();
            result
        })
    }
}
