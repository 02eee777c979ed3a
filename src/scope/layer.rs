//! Tower middleware opening the request scope.
//!
//! Opens the scope before the handler chain runs, copies the transaction id
//! into the request extensions, and wraps the rest of the request in a
//! `tracing` span carrying the id so every log line emitted while handling
//! the request is annotated with it. The scope guard travels inside the
//! response future, so items are ended exactly once whether the request
//! succeeds, errors, or is dropped mid-flight.

use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::scope::{RequestScope, TransactionId};

/// Layer applying [`RequestScopeService`] around a service.
#[derive(Clone)]
pub struct RequestScopeLayer {
    scope: RequestScope,
}

impl RequestScopeLayer {
    pub fn new(scope: RequestScope) -> Self {
        Self { scope }
    }
}

impl<S> Layer<S> for RequestScopeLayer {
    type Service = RequestScopeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestScopeService {
            inner,
            scope: self.scope.clone(),
        }
    }
}

/// Middleware running each request inside an open scope.
#[derive(Clone)]
pub struct RequestScopeService<S> {
    inner: S,
    scope: RequestScope,
}

impl<S> Service<Request<Body>> for RequestScopeService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let active = self.scope.open();
        let transaction = active.context().get::<TransactionId>().cloned();

        let span = match &transaction {
            Some(id) => tracing::info_span!(
                "request",
                txn = %id,
                method = %request.method(),
                path = %request.uri().path(),
            ),
            None => tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
            ),
        };

        if let Some(id) = transaction {
            request.extensions_mut().insert(id);
        }

        // Invoke the inner chain from inside the instrumented future so the
        // span is current when downstream layers capture it.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(
            async move {
                let result = inner.call(request).await;
                // Ends every scope item, in reverse order, exactly once.
                drop(active);
                result
            }
            .instrument(span),
        )
    }
}
