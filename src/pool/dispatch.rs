//! Tower middleware routing requests through the dispatch pool.
//!
//! Each request's inner-service future is shipped to the pool as a job and
//! the response comes back over a oneshot channel. Rejections at admission
//! (queue full, pool closed) are answered with `503 Service Unavailable`
//! without touching the handler chain.

use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::pool::worker::{DispatchPool, SubmitError};

/// Layer applying [`Dispatch`] around a service.
#[derive(Clone)]
pub struct DispatchLayer {
    pool: DispatchPool,
}

impl DispatchLayer {
    pub fn new(pool: DispatchPool) -> Self {
        Self { pool }
    }
}

impl<S> Layer<S> for DispatchLayer {
    type Service = Dispatch<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Dispatch {
            inner,
            pool: self.pool.clone(),
        }
    }
}

/// Middleware executing the wrapped service on the dispatch pool.
#[derive(Clone)]
pub struct Dispatch<S> {
    inner: S,
    pool: DispatchPool,
}

impl<S> Service<Request<Body>> for Dispatch<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Admission is decided per request in `call`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Take the service that was polled ready; leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let (tx, rx) = oneshot::channel();
        // Carry the request span across the hop onto the worker task.
        let span = tracing::Span::current();
        let job = async move {
            let response = match inner.call(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            let _ = tx.send(response);
        }
        .instrument(span);

        let submitted = self.pool.submit(Box::pin(job));
        Box::pin(async move {
            let response = match submitted {
                Ok(()) => match rx.await {
                    Ok(response) => response,
                    // The worker caught a panic, or the job was dropped
                    // while draining.
                    Err(_) => reply(StatusCode::INTERNAL_SERVER_ERROR, "request aborted"),
                },
                Err(SubmitError::QueueFull) => {
                    reply(StatusCode::SERVICE_UNAVAILABLE, "dispatch queue full")
                }
                Err(SubmitError::NotRunning) => {
                    reply(StatusCode::SERVICE_UNAVAILABLE, "server not accepting requests")
                }
            };
            Ok(response)
        })
    }
}

fn reply(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}
