//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     "GET /books/:id" + handler
//!     → pattern.rs (split method, validate path)
//!     → matcher.rs (compile path pattern)
//!     → route.rs (bind handler → Route)
//!
//! Incoming request:
//!     → router.rs (OPTIONS short-circuit, request observer)
//!     → for each Route in declaration order:
//!         pattern.rs (method + path match → Params)
//!         route.rs (run handler → Handled | NotHandled)
//!     → first Handled response, or 404
//!     → response observer
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable at runtime
//! - No regex engine; named, optional, repeated and wildcard segments only
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order, never reordered)

pub mod matcher;
pub mod params;
pub mod pattern;
pub mod route;
pub mod router;

pub use matcher::PathPattern;
pub use params::Params;
pub use pattern::{parse_pattern, Pattern, RouteSpec};
pub use route::{make_route, sync_handler, Handler, HandlerContext, IntoOutcome, Outcome, Route};
pub use router::{make_handler, Dispatcher};
