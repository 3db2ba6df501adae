//! Route spec parsing: `"[METHOD ]/path/pattern"`.
//!
//! # Responsibilities
//! - Split an optional method token off the front of a route spec
//! - Compile the remaining path into a [`PathPattern`]
//! - Match a request path and method against the compiled result
//!
//! # Design Decisions
//! - Method comparison is case-insensitive; the stored method is uppercase
//! - A method mismatch returns before the path is examined
//! - The method is separated by exactly one space; anything after that first
//!   space is the path, embedded spaces included

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::error::PatternSyntaxError;
use crate::routing::matcher::PathPattern;
use crate::routing::params::Params;

/// A route spec split into its method and path parts, not yet compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Option<Method>,
    pub path: String,
}

impl RouteSpec {
    pub fn parse(spec: &str) -> Result<Self, PatternSyntaxError> {
        let spec = spec.trim();

        let (method, path) = if spec.starts_with('/') {
            (None, spec)
        } else {
            let (token, rest) = spec.split_once(' ').unwrap_or((spec, ""));
            let upper = token.to_ascii_uppercase();
            let method = Method::from_bytes(upper.as_bytes()).map_err(|_| {
                PatternSyntaxError::InvalidMethod {
                    method: token.to_string(),
                }
            })?;
            (Some(method), rest)
        };

        if !path.starts_with('/') {
            return Err(PatternSyntaxError::MissingLeadingSlash {
                pattern: path.to_string(),
            });
        }

        Ok(Self {
            method,
            path: path.to_string(),
        })
    }
}

impl FromStr for RouteSpec {
    type Err = PatternSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A compiled route spec.
#[derive(Debug, Clone)]
pub struct Pattern {
    method: Option<Method>,
    path: PathPattern,
}

impl Pattern {
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    /// Test a request. `None` means no match; an empty [`Params`] is still a match.
    pub fn matches(&self, path: &str, method: &Method) -> Option<Params> {
        if let Some(required) = &self.method {
            if !required.as_str().eq_ignore_ascii_case(method.as_str()) {
                return None;
            }
        }
        self.path.captures(path)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

impl TryFrom<RouteSpec> for Pattern {
    type Error = PatternSyntaxError;

    fn try_from(spec: RouteSpec) -> Result<Self, Self::Error> {
        Ok(Self {
            path: PathPattern::compile(&spec.path)?,
            method: spec.method,
        })
    }
}

/// Parse and compile a route spec such as `"GET /books/:id"` or `"/settings"`.
pub fn parse_pattern(spec: &str) -> Result<Pattern, PatternSyntaxError> {
    RouteSpec::parse(spec)?.try_into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_prefix() {
        let spec = RouteSpec::parse("  get /index.html ").unwrap();
        assert_eq!(spec.method, Some(Method::GET));
        assert_eq!(spec.path, "/index.html");

        let spec = RouteSpec::parse("POST /").unwrap();
        assert_eq!(spec.method, Some(Method::POST));
        assert_eq!(spec.path, "/");

        let spec: RouteSpec = "/blog/posts/:slug".parse().unwrap();
        assert_eq!(spec.method, None);
    }

    #[test]
    fn test_extension_methods_are_uppercased() {
        let spec = RouteSpec::parse("purge /cache").unwrap();
        assert_eq!(spec.method.as_ref().map(Method::as_str), Some("PURGE"));
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        assert!(matches!(
            RouteSpec::parse("GET"),
            Err(PatternSyntaxError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            RouteSpec::parse("GET  /double-space"),
            Err(PatternSyntaxError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            RouteSpec::parse("GET index.html"),
            Err(PatternSyntaxError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            RouteSpec::parse("G{T /"),
            Err(PatternSyntaxError::InvalidMethod { .. })
        ));
        assert!(parse_pattern("/a/:").is_err());
    }

    #[test]
    fn test_method_mismatch_rejects_any_path() {
        let pattern = parse_pattern("GET /health").unwrap();
        assert!(pattern.matches("/health", &Method::GET).is_some());
        assert!(pattern.matches("/health", &Method::POST).is_none());
        assert!(pattern.matches("/other", &Method::POST).is_none());
    }

    #[test]
    fn test_method_comparison_ignores_case() {
        let pattern = parse_pattern("get /health").unwrap();
        let lower = Method::from_bytes(b"get").unwrap();
        assert!(pattern.matches("/health", &lower).is_some());
    }

    #[test]
    fn test_no_method_matches_every_method() {
        let pattern = parse_pattern("/settings").unwrap();
        for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH, Method::OPTIONS] {
            assert!(pattern.matches("/settings", &method).is_some());
        }
        assert!(pattern.matches("/settings/", &Method::GET).is_none());
    }

    #[test]
    fn test_display_round_trips_spec() {
        assert_eq!(parse_pattern("delete /books/:id").unwrap().to_string(), "DELETE /books/:id");
        assert_eq!(parse_pattern("/").unwrap().to_string(), "/");
    }
}
