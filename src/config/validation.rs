//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderValue, StatusCode};

use crate::config::schema::RouterConfig;
use crate::error::PatternSyntaxError;
use crate::routing::parse_pattern;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("dispatch.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("invalid cors.allow_origin {0:?}")]
    CorsOrigin(String),

    #[error("route {index} ({pattern:?}): {source}")]
    Pattern {
        index: usize,
        pattern: String,
        source: PatternSyntaxError,
    },

    #[error("route {index}: invalid status {status}")]
    Status { index: usize, status: u16 },

    #[error("route {index}: invalid content type {value:?}")]
    ContentType { index: usize, value: String },
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.dispatch.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.cors.enabled && HeaderValue::from_str(&config.cors.allow_origin).is_err() {
        errors.push(ValidationError::CorsOrigin(config.cors.allow_origin.clone()));
    }

    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = parse_pattern(&route.pattern) {
            errors.push(ValidationError::Pattern {
                index,
                pattern: route.pattern.clone(),
                source,
            });
        }
        if StatusCode::from_u16(route.status).is_err() {
            errors.push(ValidationError::Status {
                index,
                status: route.status,
            });
        }
        if let Some(value) = &route.content_type {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::ContentType {
                    index,
                    value: value.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
