//! Error responses.
//!
//! Every error leaving the server is JSON with an `error` field. Admission
//! failures map to specific 4xx codes; anything internal is a 500 whose
//! detail is only exposed outside production.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
const GENERIC_DETAIL: &str = "Something went wrong";

/// Errors produced by the pipeline or a handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized origin")]
    UnauthorizedOrigin,

    #[error("{message}")]
    RateLimited { message: String, retry_after: String },

    #[error("Payload too large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid request body")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl ErrorBody<'_> {
    fn plain(error: &str) -> ErrorBody<'_> {
        ErrorBody {
            error,
            retry_after: None,
            message: None,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnauthorizedOrigin => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::RateLimited {
                message,
                retry_after,
            } => ErrorBody {
                error: message.as_str(),
                retry_after: Some(retry_after.as_str()),
                message: None,
            },
            ApiError::Internal(_) => ErrorBody::plain(INTERNAL_SERVER_ERROR),
            ApiError::BadRequest(detail) => {
                tracing::debug!(detail = %detail, "Rejecting malformed request body");
                ErrorBody::plain("Invalid request body")
            }
            other => {
                let text = other.to_string();
                return (status, Json(ErrorBody::plain(&text))).into_response();
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Response for a failure that escaped every earlier stage.
pub fn terminal_error(detail: &str, production: bool) -> Response {
    let message = if production { GENERIC_DETAIL } else { detail };
    let body = ErrorBody {
        error: INTERNAL_SERVER_ERROR,
        retry_after: None,
        message: Some(message),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    }
}

/// Render a caught panic payload as the terminal error response.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>, production: bool) -> Response {
    let detail = panic_message(payload.as_ref());

    tracing::error!(panic = %detail, "Unhandled failure while serving request");
    terminal_error(detail, production)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_origin_shape() {
        let response = ApiError::UnauthorizedOrigin.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized origin" }));
    }

    #[tokio::test]
    async fn test_rate_limited_shape() {
        let response = ApiError::RateLimited {
            message: "Too many API requests, please try again later.".into(),
            retry_after: "1 minute".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Too many API requests, please try again later.",
                "retryAfter": "1 minute",
            })
        );
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let response = ApiError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_terminal_error_verbosity() {
        let dev = body_json(terminal_error("index out of bounds", false)).await;
        assert_eq!(dev["message"], "index out of bounds");

        let prod = body_json(terminal_error("index out of bounds", true)).await;
        assert_eq!(prod["error"], "Internal server error");
        assert_eq!(prod["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_panic_payload_downcast() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
        let body = body_json(panic_response(payload, false)).await;
        assert_eq!(body["message"], "boom");
    }
}
