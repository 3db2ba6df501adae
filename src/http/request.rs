//! Request preparation for dispatch.
//!
//! # Responsibilities
//! - Buffer the request body once, within the configured limit
//! - Reconstruct the absolute request URL from the URI and `Host` header
//!
//! # Design Decisions
//! - Handlers see `Request<Bytes>`; streaming bodies are not exposed
//! - The URL is built once per request and shared by every route trial

use std::str::FromStr;

use axum::body::Body;
use axum::http::uri::Authority;
use axum::http::{header, Request};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use url::Url;

/// The request type handed to routes and handlers.
pub type RouteRequest = Request<Bytes>;

/// Failure preparing a request for dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Read the body of `request` into memory.
pub async fn buffer_body(request: Request<Body>, limit: usize) -> Result<RouteRequest, RequestError> {
    let (parts, body) = request.into_parts();
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => return Err(RequestError::BodyTooLarge { limit }),
        Err(e) => return Err(RequestError::Body(e)),
    };
    Ok(Request::from_parts(parts, bytes))
}

/// Absolute URL of `request`.
///
/// Absolute-form URIs are used as-is. Origin-form URIs are resolved against
/// `http://<Host>`, falling back to `default_host` when the header is missing.
/// The host must be a bare authority; the path and query always come from the
/// request URI.
pub fn request_url<B>(request: &Request<B>, default_host: &str) -> Result<Url, RequestError> {
    let uri = request.uri();
    if uri.scheme().is_some() {
        return Ok(Url::parse(&uri.to_string())?);
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(default_host);

    let authority =
        Authority::from_str(host).map_err(|_| RequestError::InvalidHost(host.to_string()))?;
    let mut url = Url::parse(&format!("http://{authority}/"))?;
    url.set_path(uri.path());
    url.set_query(uri.query());
    Ok(url)
}
