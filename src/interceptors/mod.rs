//! Request, response and error observers.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → on_request(request, url)      once per non-OPTIONS request
//!     → Route boundary
//!         → on_error(message, trace)  once per handler failure
//!     → on_response(&mut response)    once per returned response
//! ```
//!
//! # Design Decisions
//! - One optional observer per kind; setting one replaces the previous
//! - Observers are side channels: return values are ignored, the response
//!   observer acts only by mutating the response in place
//! - A panicking observer is logged and swallowed; the response pipeline
//!   always completes
//! - An explicit [`Interceptors`] value can be handed to a dispatcher; the
//!   process-wide slots in [`registry`] serve dispatchers built without one

pub mod cors;
pub mod registry;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::response::Response;
use url::Url;

use crate::http::request::RouteRequest;
use crate::routing::route::panic_message;

pub use cors::{cors_any, enable_cors};
pub use registry::{set_error_interceptor, set_request_interceptor, set_response_interceptor};

/// Receives `(message, trace)` for each handler failure.
pub type ErrorInterceptor = Arc<dyn Fn(&str, &str) + Send + Sync>;
/// Sees each request before route trials begin.
pub type RequestInterceptor = Arc<dyn Fn(&RouteRequest, &Url) + Send + Sync>;
/// May mutate each response before it is returned.
pub type ResponseInterceptor = Arc<dyn Fn(&mut Response) + Send + Sync>;

/// One optional observer per pipeline stage.
#[derive(Clone, Default)]
pub struct Interceptors {
    error: Option<ErrorInterceptor>,
    request: Option<RequestInterceptor>,
    response: Option<ResponseInterceptor>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteRequest, &Url) + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Response) + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(f));
        self
    }

    pub fn set_error(&mut self, f: ErrorInterceptor) {
        self.error = Some(f);
    }

    pub fn set_request(&mut self, f: RequestInterceptor) {
        self.request = Some(f);
    }

    pub fn set_response(&mut self, f: ResponseInterceptor) {
        self.response = Some(f);
    }

    pub fn notify_error(&self, message: &str, trace: &str) {
        if let Some(f) = &self.error {
            guarded("error", || f(message, trace));
        }
    }

    pub fn notify_request(&self, request: &RouteRequest, url: &Url) {
        if let Some(f) = &self.request {
            guarded("request", || f(request, url));
        }
    }

    pub fn notify_response(&self, response: &mut Response) {
        if let Some(f) = &self.response {
            guarded("response", || f(response));
        }
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("error", &self.error.is_some())
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}

fn guarded(kind: &'static str, f: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::error!(
            interceptor = kind,
            panic = %panic_message(payload.as_ref()),
            "Interceptor panicked; ignoring"
        );
    }
}
