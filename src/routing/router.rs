//! Ordered dispatch over declared routes.
//!
//! # Responsibilities
//! - Answer `OPTIONS` requests without consulting any route
//! - Run the request observer, then try routes in declaration order
//! - Return the first conclusive response, or a 404
//! - Pass every returned response through the response observer
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - O(n) scan in declaration order; first match wins and no later route runs
//! - Routes are tried one at a time, never concurrently
//! - No timeout or cancellation here; that belongs to the transport layer

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::Service;

use crate::config::DispatchConfig;
use crate::http::request::{buffer_body, request_url, RequestError};
use crate::http::response;
use crate::interceptors::{registry, Interceptors};
use crate::observability::metrics;
use crate::routing::route::{Outcome, Route};

/// Turns requests into responses using an ordered list of routes.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    routes: Vec<Route>,
    /// `None` reads the process-wide registry on each request.
    interceptors: Option<Arc<Interceptors>>,
    settings: DispatchConfig,
}

impl Dispatcher {
    /// Dispatcher observed through the process-wide interceptor registry.
    pub fn new(routes: Vec<Route>) -> Self {
        Self::build(routes, None)
    }

    /// Dispatcher with its own observers, independent of the registry.
    pub fn with_interceptors(routes: Vec<Route>, interceptors: Interceptors) -> Self {
        Self::build(routes, Some(Arc::new(interceptors)))
    }

    fn build(routes: Vec<Route>, interceptors: Option<Arc<Interceptors>>) -> Self {
        tracing::debug!(routes = routes.len(), "Dispatcher built");
        Self {
            inner: Arc::new(Inner {
                routes,
                interceptors,
                settings: DispatchConfig::default(),
            }),
        }
    }

    /// Replace the dispatch settings (body limit, default host).
    pub fn with_settings(mut self, settings: DispatchConfig) -> Self {
        Arc::make_mut(&mut self.inner).settings = settings;
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.inner.routes
    }

    fn interceptors(&self) -> Arc<Interceptors> {
        match &self.inner.interceptors {
            Some(own) => Arc::clone(own),
            None => registry::global(),
        }
    }

    /// Produce the response for one request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let interceptors = self.interceptors();
        let method = request.method().clone();

        if method == Method::OPTIONS {
            return finish(&interceptors, response::options_ok(), &method, "options", start);
        }

        let url = match request_url(&request, &self.inner.settings.default_host) {
            Ok(url) => Arc::new(url),
            Err(e) => {
                tracing::warn!(uri = %request.uri(), error = %e, "Rejecting request");
                return finish(&interceptors, response::bad_request(), &method, "none", start);
            }
        };

        let request = match buffer_body(request, self.inner.settings.max_body_bytes).await {
            Ok(request) => Arc::new(request),
            Err(e @ RequestError::BodyTooLarge { .. }) => {
                tracing::warn!(path = %url.path(), error = %e, "Rejecting request");
                return finish(&interceptors, response::payload_too_large(), &method, "none", start);
            }
            Err(e) => {
                tracing::warn!(path = %url.path(), error = %e, "Rejecting request");
                return finish(&interceptors, response::bad_request(), &method, "none", start);
            }
        };

        tracing::debug!(method = %method, path = %url.path(), "Dispatching request");
        interceptors.notify_request(&request, &url);

        for route in &self.inner.routes {
            match route.handle(&request, &url, &interceptors).await {
                Outcome::Handled(response) => {
                    let label = route.pattern().to_string();
                    tracing::debug!(route = %label, status = %response.status(), "Route matched");
                    return finish(&interceptors, response, &method, &label, start);
                }
                Outcome::NotHandled => {
                    tracing::trace!(route = %route.pattern(), "Route declined");
                }
            }
        }

        tracing::warn!(method = %method, path = %url.path(), "No route matched");
        finish(&interceptors, response::not_found(), &method, "none", start)
    }
}

fn finish(
    interceptors: &Interceptors,
    mut response: Response,
    method: &Method,
    route: &str,
    start: Instant,
) -> Response {
    interceptors.notify_response(&mut response);
    metrics::record_dispatch(method.as_str(), response.status().as_u16(), route, start);
    response
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.inner.routes)
            .field("interceptors", &self.inner.interceptors)
            .finish()
    }
}

impl Service<Request<Body>> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.handle(request).await) })
    }
}

/// Build a dispatcher over `routes`, tried in the given order.
///
/// Observers come from the process-wide registry
/// ([`set_response_interceptor`](crate::interceptors::set_response_interceptor) and friends).
pub fn make_handler(routes: Vec<Route>) -> Dispatcher {
    Dispatcher::new(routes)
}
