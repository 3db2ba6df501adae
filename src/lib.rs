//! Pattern-based HTTP request router.
//!
//! Routes pair a spec such as `"GET /books/:id"` with a handler. A
//! [`Dispatcher`] tries them in declaration order and returns the first
//! conclusive response, or `404 not found`.
//!
//! ```no_run
//! use axum::response::IntoResponse;
//! use pattern_router::{make_handler, make_route, sync_handler, HandlerContext};
//!
//! # fn main() -> Result<(), pattern_router::PatternSyntaxError> {
//! let dispatcher = make_handler(vec![
//!     make_route("GET /health", sync_handler(|_| "ok".into_response()))?,
//!     make_route("/users/:id", |ctx: HandlerContext| async move {
//!         ctx.params.get("id").unwrap_or_default().to_string().into_response()
//!     })?,
//! ]);
//! # let _ = dispatcher;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod interceptors;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use error::{HandlerError, PatternSyntaxError};
pub use http::{error_to_response, HttpServer, RouteRequest};
pub use interceptors::{
    cors_any, enable_cors, set_error_interceptor, set_request_interceptor,
    set_response_interceptor, Interceptors,
};
pub use routing::{
    make_handler, make_route, parse_pattern, sync_handler, Dispatcher, HandlerContext, Outcome,
    Params, Route,
};
