//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the Dispatcher from configured static routes
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down gracefully

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{ConfigError, RouteConfig, RouterConfig};
use crate::interceptors::{enable_cors, Interceptors};
use crate::routing::{make_route, sync_handler, Dispatcher, Route};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// HTTP server answering requests through a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Serve the static routes declared in `config`.
    ///
    /// The config is validated first, so configs built in code get the same
    /// checks as ones read from disk.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let routes = config
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| static_route(index, route))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        let mut interceptors = Interceptors::new();
        if config.cors.enabled {
            match enable_cors(&config.cors.allow_origin) {
                Ok(cors) => interceptors.set_response(cors),
                Err(e) => tracing::error!(error = %e, "Ignoring invalid cors.allow_origin"),
            }
        }
        interceptors.set_error(std::sync::Arc::new(|message: &str, trace: &str| {
            tracing::debug!(error = %message, trace = %trace, "Handler failure trace");
        }));

        let dispatcher = Dispatcher::with_interceptors(routes, interceptors)
            .with_settings(config.dispatch.clone());
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Serve an already-built dispatcher, e.g. one with code-defined routes.
    pub fn with_dispatcher(config: RouterConfig, dispatcher: Dispatcher) -> Self {
        let router = Self::build_router(&config, dispatcher);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RouterConfig, dispatcher: Dispatcher) -> Router {
        Router::new()
            .fallback_service(dispatcher)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.dispatch.request_timeout_secs),
            ))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// A route that always answers with the configured status, body and content type.
///
/// `index` is the route's position in the config and only labels errors.
pub fn static_route(index: usize, config: &RouteConfig) -> Result<Route, ValidationError> {
    let status = StatusCode::from_u16(config.status).map_err(|_| ValidationError::Status {
        index,
        status: config.status,
    })?;
    let content_type = config
        .content_type
        .as_deref()
        .map(|value| {
            HeaderValue::from_str(value).map_err(|_| ValidationError::ContentType {
                index,
                value: value.to_string(),
            })
        })
        .transpose()?;
    let body = config.body.clone();

    let route = make_route(
        &config.pattern,
        sync_handler(move |_| -> Response {
            let mut response = (status, body.clone()).into_response();
            if let Some(value) = &content_type {
                response.headers_mut().insert(CONTENT_TYPE, value.clone());
            }
            response
        }),
    );
    route.map_err(|source| ValidationError::Pattern {
        index,
        pattern: config.pattern.clone(),
        source,
    })
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
