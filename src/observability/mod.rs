//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, routes, server produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request counter, latency histogram)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
