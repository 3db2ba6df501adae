//! Response construction.
//!
//! # Responsibilities
//! - Fixed terminal responses (`OPTIONS` short-circuit, no route matched)
//! - Map handler failures to client-facing responses
//!
//! # Design Decisions
//! - User errors expose their message; internal failures and panics do not
//! - Error bodies are JSON: `{"error": "<message>"}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::HandlerError;

/// Reply to every `OPTIONS` request.
pub fn options_ok() -> Response {
    (StatusCode::OK, "ok").into_response()
}

/// Reply when every route declined.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "bad request").into_response()
}

pub fn payload_too_large() -> Response {
    (StatusCode::PAYLOAD_TOO_LARGE, "payload too large").into_response()
}

/// Status code for a handler failure.
pub fn error_status(err: &HandlerError) -> StatusCode {
    match err {
        HandlerError::BadParams(_) | HandlerError::User(_) => StatusCode::BAD_REQUEST,
        HandlerError::Forbidden(_) => StatusCode::FORBIDDEN,
        HandlerError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
        HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
        HandlerError::Internal(_) | HandlerError::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a handler failure for the client.
pub fn error_to_response(err: &HandlerError) -> Response {
    let message = if err.is_user_error() {
        err.to_string()
    } else {
        "internal server error".to_string()
    };
    (error_status(err), Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_status(&HandlerError::bad_params("x")), StatusCode::BAD_REQUEST);
        assert_eq!(error_status(&HandlerError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(error_status(&HandlerError::not_authenticated("x")), StatusCode::UNAUTHORIZED);
        assert_eq!(error_status(&HandlerError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(error_status(&HandlerError::user("x")), StatusCode::BAD_REQUEST);
        assert_eq!(error_status(&HandlerError::internal("x")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_user_message_is_exposed() {
        let body = json_of(error_to_response(&HandlerError::forbidden("members only"))).await;
        assert_eq!(body["error"], "members only");
    }

    #[tokio::test]
    async fn test_internal_message_is_hidden() {
        let body = json_of(error_to_response(&HandlerError::internal("db password rejected"))).await;
        assert_eq!(body["error"], "internal server error");
    }
}
