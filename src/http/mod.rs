//! HTTP plumbing around the routing core.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, tower-http layers)
//!     → routing::Dispatcher (OPTIONS short-circuit, route trials)
//!         → request.rs (buffer body, rebuild URL)
//!         → response.rs (terminal and error responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::RouteRequest;
pub use response::error_to_response;
pub use server::HttpServer;
