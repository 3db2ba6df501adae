//! Error types shared across the router.
//!
//! # Tiers
//! - [`PatternSyntaxError`]: raised while compiling a route spec. Programmer error,
//!   surfaced at registration time and never swallowed.
//! - [`HandlerError`]: raised by a handler at request time. Caught at the route
//!   boundary, reported to the error observer and rendered by
//!   [`error_to_response`](crate::http::response::error_to_response).
//!
//! A handler declining a request is not an error; see [`Outcome`](crate::routing::Outcome).

use std::error::Error as StdError;
use std::fmt::Write as _;

/// A route spec that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternSyntaxError {
    #[error("path pattern must start with '/': {pattern:?}")]
    MissingLeadingSlash { pattern: String },

    #[error("invalid method token {method:?}")]
    InvalidMethod { method: String },

    #[error("parameter name expected after ':' at offset {offset}")]
    EmptyParamName { offset: usize },

    #[error("duplicate parameter name {name:?}")]
    DuplicateParam { name: String },

    #[error("regular expression groups are not supported (offset {offset})")]
    RegexGroup { offset: usize },

    #[error("unbalanced '{{' or '}}' at offset {offset}")]
    UnbalancedGroup { offset: usize },

    #[error("nested groups are not supported (offset {offset})")]
    NestedGroup { offset: usize },

    #[error("modifier {modifier:?} at offset {offset} has nothing to modify")]
    DanglingModifier { modifier: char, offset: usize },

    #[error("pattern ends with a dangling escape")]
    DanglingEscape,
}

/// A failure raised by a route handler.
///
/// The first five variants form the user-error taxonomy: their message is safe to show
/// to clients. `Internal` and `Panic` are rendered as an opaque 500.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadParams(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Internal(#[source] Box<dyn StdError + Send + Sync>),

    #[error("handler panicked: {0}")]
    Panic(String),
}

impl HandlerError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::BadParams(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::NotAuthenticated(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    /// Wrap any error as an internal failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Internal(err.into())
    }

    /// True for every variant whose message is meant for the client.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::BadParams(_)
                | Self::Forbidden(_)
                | Self::NotAuthenticated(_)
                | Self::NotFound(_)
                | Self::User(_)
        )
    }

    pub fn is_bad_params(&self) -> bool {
        matches!(self, Self::BadParams(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Display of the error followed by its `source()` chain.
    pub fn trace(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        // `Internal` displays its source, so skip the repeat.
        if matches!(self, Self::Internal(_)) {
            source = source.and_then(|s| s.source());
        }
        while let Some(cause) = source {
            let _ = write!(out, "\ncaused by: {cause}");
            source = cause.source();
        }
        out
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadParams(err.to_string())
    }
}
