//! CORS response headers.

use std::sync::Arc;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;
use axum::response::Response;

use crate::interceptors::ResponseInterceptor;

/// A response interceptor that appends CORS headers allowing `domains`.
///
/// Headers are appended, never replaced. Install it with
/// [`set_response_interceptor`](super::set_response_interceptor) or
/// [`Interceptors::set_response`](super::Interceptors::set_response).
pub fn enable_cors(domains: &str) -> Result<ResponseInterceptor, InvalidHeaderValue> {
    Ok(cors_headers(HeaderValue::from_str(domains)?))
}

/// [`enable_cors`] for any origin (`*`).
pub fn cors_any() -> ResponseInterceptor {
    cors_headers(HeaderValue::from_static("*"))
}

fn cors_headers(origin: HeaderValue) -> ResponseInterceptor {
    let any = HeaderValue::from_static("*");
    Arc::new(move |response: &mut Response| {
        let headers = response.headers_mut();
        headers.append(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.append(ACCESS_CONTROL_REQUEST_HEADERS, any.clone());
        headers.append(ACCESS_CONTROL_REQUEST_METHOD, any.clone());
    })
}
