//! Route construction: a compiled pattern bound to a handler.
//!
//! # Responsibilities
//! - Compile the route spec once, at registration
//! - Run the handler for matching requests and normalize its result
//! - Catch handler failures (errors and panics), report them to the error
//!   observer and turn them into a conclusive response
//!
//! # Design Decisions
//! - Declining is a typed value ([`Outcome::NotHandled`]), never an error
//! - Routes hold no per-request state; one `Route` serves concurrent requests
//! - The handler context is owned so handler futures can be `'static`

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use url::Url;

use crate::error::{HandlerError, PatternSyntaxError};
use crate::http::request::RouteRequest;
use crate::http::response::error_to_response;
use crate::interceptors::Interceptors;
use crate::routing::params::Params;
use crate::routing::pattern::{parse_pattern, Pattern};

/// What a route did with a request.
#[derive(Debug)]
pub enum Outcome {
    /// Conclusive: dispatch stops with this response.
    Handled(Response),
    /// The route does not apply; dispatch moves on to the next one.
    NotHandled,
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled(_))
    }

    pub fn into_handled(self) -> Option<Response> {
        match self {
            Outcome::Handled(response) => Some(response),
            Outcome::NotHandled => None,
        }
    }
}

/// Everything a handler gets to see for one matched request.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub params: Params,
    pub url: Arc<Url>,
    pub request: Arc<RouteRequest>,
}

/// Conversion from a handler's return value into an [`Outcome`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, HandlerError>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(self)
    }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(Outcome::Handled(self))
    }
}

/// `()` declines.
impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(Outcome::NotHandled)
    }
}

impl<R: IntoResponse> IntoOutcome for Option<R> {
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        Ok(match self {
            Some(response) => Outcome::Handled(response.into_response()),
            None => Outcome::NotHandled,
        })
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<HandlerError>,
{
    fn into_outcome(self) -> Result<Outcome, HandlerError> {
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => Err(err.into()),
        }
    }
}

/// A request handler bound to a route.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: HandlerContext) -> BoxFuture<'static, Result<Outcome, HandlerError>>;
}

impl<F, Fut, T> Handler for F
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: IntoOutcome,
{
    fn call(&self, ctx: HandlerContext) -> BoxFuture<'static, Result<Outcome, HandlerError>> {
        let fut = (self)(ctx);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

/// Adapter for handlers that produce their result without awaiting.
pub struct SyncHandler<F>(F);

/// Wrap a synchronous closure so it can be passed to [`make_route`].
pub fn sync_handler<F, T>(f: F) -> SyncHandler<F>
where
    F: Fn(HandlerContext) -> T + Send + Sync + 'static,
    T: IntoOutcome,
{
    SyncHandler(f)
}

impl<F, T> Handler for SyncHandler<F>
where
    F: Fn(HandlerContext) -> T + Send + Sync + 'static,
    T: IntoOutcome,
{
    fn call(&self, ctx: HandlerContext) -> BoxFuture<'static, Result<Outcome, HandlerError>> {
        let result = (self.0)(ctx).into_outcome();
        Box::pin(std::future::ready(result))
    }
}

/// A compiled pattern plus the handler it guards.
#[derive(Clone)]
pub struct Route {
    pattern: Arc<Pattern>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new<H: Handler>(spec: &str, handler: H) -> Result<Self, PatternSyntaxError> {
        Ok(Self {
            pattern: Arc::new(parse_pattern(spec)?),
            handler: Arc::new(handler),
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Try this route against one request.
    ///
    /// Returns [`Outcome::NotHandled`] when the pattern does not match or the handler
    /// declines. Handler failures produce a conclusive error response.
    pub async fn handle(
        &self,
        request: &Arc<RouteRequest>,
        url: &Arc<Url>,
        interceptors: &Interceptors,
    ) -> Outcome {
        let Some(params) = self.pattern.matches(url.path(), request.method()) else {
            return Outcome::NotHandled;
        };

        let ctx = HandlerContext {
            params,
            url: Arc::clone(url),
            request: Arc::clone(request),
        };

        // The call itself runs inside the boundary so eager panics are caught too.
        let result = AssertUnwindSafe(async move { self.handler.call(ctx).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(HandlerError::Panic(panic_message(payload.as_ref()))));

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                let trace = err.trace();
                tracing::error!(route = %self.pattern, error = %err, "Route handler failed");
                interceptors.notify_error(&err.to_string(), &trace);
                Outcome::Handled(error_to_response(&err))
            }
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.to_string())
            .finish_non_exhaustive()
    }
}

/// Compile `spec` and bind it to `handler`.
///
/// `spec` is a path pattern, optionally preceded by a method and one space:
/// `"GET /index.html"`, `"POST /"`, `"/"`, `"/blog/posts/:slug"`.
pub fn make_route<H: Handler>(spec: &str, handler: H) -> Result<Route, PatternSyntaxError> {
    Route::new(spec, handler)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
