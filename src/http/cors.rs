//! CORS filter construction.
//!
//! The filter itself is tower-http's; this module turns a [`CorsConfig`]
//! into a `CorsLayer` and scopes it to servlet-style url patterns with a
//! thin wrapper service. Requests on paths outside the patterns bypass the
//! filter entirely and carry no CORS headers.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use axum::response::Response;
use futures_util::future::Either;
use thiserror::Error;
use tower::{Layer, Service};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Cors, CorsLayer, ExposeHeaders};
use tracing::debug;

use crate::config::validation::split_list;
use crate::config::CorsConfig;

/// Error building a CORS filter from config.
#[derive(Debug, Error)]
pub enum CorsBuildError {
    #[error("invalid CORS origin {0:?}")]
    BadOrigin(String),

    #[error("invalid CORS method {0:?}")]
    BadMethod(String),

    #[error("invalid CORS header {0:?}")]
    BadHeader(String),

    #[error("invalid CORS url pattern {0:?}")]
    BadPattern(String),
}

/// A servlet-style path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    /// `/*` — every path.
    All,
    /// `/` — the root path only.
    Root,
    /// `/path` — exact match.
    Exact(String),
    /// `/path/*` — the path itself and everything below it.
    Prefix(String),
    /// `*.ext` — paths ending in the extension.
    Suffix(String),
}

impl PathPattern {
    fn parse(raw: &str) -> Result<Self, CorsBuildError> {
        if raw == "/*" {
            return Ok(Self::All);
        }
        if raw == "/" {
            return Ok(Self::Root);
        }
        if let Some(extension) = raw.strip_prefix("*.") {
            if extension.is_empty() {
                return Err(CorsBuildError::BadPattern(raw.to_string()));
            }
            return Ok(Self::Suffix(format!(".{extension}")));
        }
        if let Some(prefix) = raw.strip_suffix("/*") {
            if prefix.starts_with('/') {
                return Ok(Self::Prefix(prefix.to_string()));
            }
        }
        if raw.starts_with('/') {
            return Ok(Self::Exact(raw.to_string()));
        }
        Err(CorsBuildError::BadPattern(raw.to_string()))
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Root => path == "/",
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            Self::Suffix(suffix) => path.ends_with(suffix.as_str()),
        }
    }
}

/// The compiled pattern list of one filter.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<PathPattern>,
}

impl PatternSet {
    pub fn parse(raw: &[String]) -> Result<Self, CorsBuildError> {
        let patterns = raw
            .iter()
            .map(|pattern| PathPattern::parse(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}

/// Build a pattern-scoped CORS layer from config.
pub fn build_scoped_layer(config: &CorsConfig) -> Result<ScopedCorsLayer, CorsBuildError> {
    let patterns = PatternSet::parse(&config.url_patterns)?;

    let origins = config.allowed_origins.trim();
    let allow_origin = if origins == "*" {
        if config.allow_credentials {
            // The fetch spec forbids a literal `*` with credentials; echo
            // the request origin instead, which admits every origin.
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let list = split_list(origins)
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| CorsBuildError::BadOrigin(origin.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(list)
    };

    let methods = split_list(&config.allowed_methods)
        .map(|method| {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| CorsBuildError::BadMethod(method.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let headers = split_list(&config.allowed_headers)
        .map(|header| {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| CorsBuildError::BadHeader(header.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(AllowHeaders::list(headers))
        .max_age(Duration::from_secs(config.preflight_max_age_secs));

    if config.allow_credentials {
        cors = cors.allow_credentials(true);
    }

    let exposed = split_list(&config.exposed_headers)
        .map(|header| {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| CorsBuildError::BadHeader(header.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if !exposed.is_empty() {
        cors = cors.expose_headers(ExposeHeaders::list(exposed));
    }

    if config.chain_preflight {
        // The filter answers preflight itself; the chain never sees it.
        debug!("chain_preflight is set; preflight requests are still terminated at the CORS filter");
    }

    Ok(ScopedCorsLayer {
        patterns: Arc::new(patterns),
        cors,
    })
}

/// Layer applying a CORS filter to requests whose path matches the patterns.
#[derive(Clone)]
pub struct ScopedCorsLayer {
    patterns: Arc<PatternSet>,
    cors: CorsLayer,
}

impl<S: Clone> Layer<S> for ScopedCorsLayer {
    type Service = ScopedCors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ScopedCors {
            filtered: self.cors.layer(inner.clone()),
            plain: inner,
            patterns: self.patterns.clone(),
        }
    }
}

/// Routes in-scope requests through the CORS filter, others around it.
#[derive(Clone)]
pub struct ScopedCors<S> {
    filtered: Cors<S>,
    plain: S,
    patterns: Arc<PatternSet>,
}

impl<S> Service<Request<Body>> for ScopedCors<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone,
    Cors<S>: Service<Request<Body>, Response = Response, Error = Infallible>,
{
    type Response = Response;
    type Error = Infallible;
    type Future =
        Either<<Cors<S> as Service<Request<Body>>>::Future, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.filtered.poll_ready(cx)? {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(()) => {}
        }
        self.plain.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if self.patterns.matches(request.uri().path()) {
            Either::Left(self.filtered.call(request))
        } else {
            Either::Right(self.plain.call(request))
        }
    }
}
