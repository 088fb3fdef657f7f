//! Request body limits and parsing.
//!
//! First stage of the pipeline. JSON and URL-encoded bodies are buffered up
//! to the configured ceiling and decoded; the decoded value is attached to the
//! request as [`ParsedBody`]. Oversized bodies are rejected with 413 and
//! malformed JSON with 400 before any handler runs.
//!
//! # Design Decisions
//! - A declared `Content-Length` above the ceiling is rejected without reading
//! - Bodies of other content types are not buffered, but the declared length
//!   is still checked; undeclared ones are capped while streaming by
//!   `RequestBodyLimitLayer`

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use url::form_urlencoded;

use crate::http::response::ApiError;
use crate::observability::metrics;

/// Body size ceiling shared by every route.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
}

impl BodyLimits {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

/// Decoded request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Other;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn reject(error: ApiError, reason: &'static str) -> Response {
    metrics::record_body_rejected(reason);
    error.into_response()
}

pub async fn body_parser_middleware(
    State(limits): State<BodyLimits>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(length) = declared_length(request.headers()) {
        if length > limits.max_bytes as u64 {
            tracing::warn!(
                declared = length,
                limit = limits.max_bytes,
                "Rejecting oversized request body"
            );
            return reject(
                ApiError::PayloadTooLarge {
                    limit: limits.max_bytes,
                },
                "too_large",
            );
        }
    }

    let kind = body_kind(request.headers());
    if kind == BodyKind::Other {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, limits.max_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit = limits.max_bytes, "Failed to buffer request body");
            return reject(
                ApiError::PayloadTooLarge {
                    limit: limits.max_bytes,
                },
                "too_large",
            );
        }
    };

    if !bytes.is_empty() {
        let parsed = match kind {
            BodyKind::Json => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => ParsedBody::Json(value),
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed JSON body");
                    return reject(ApiError::BadRequest(e.to_string()), "malformed");
                }
            },
            _ => ParsedBody::Form(form_urlencoded::parse(&bytes).into_owned().collect()),
        };
        parts.extensions.insert(parsed);
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{HeaderValue, StatusCode},
        middleware::from_fn_with_state,
        routing::post,
        Extension, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(limit: usize, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/echo",
                post(move |body: Option<Extension<ParsedBody>>| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        match body {
                            Some(Extension(ParsedBody::Json(v))) => v.to_string(),
                            Some(Extension(ParsedBody::Form(pairs))) => format!("{:?}", pairs),
                            None => "none".to_string(),
                        }
                    }
                }),
            )
            .layer(from_fn_with_state(BodyLimits::new(limit), body_parser_middleware))
    }

    fn post_req(content_type: &'static str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_body_kind() {
        let mut headers = HeaderMap::new();
        assert_eq!(body_kind(&headers), BodyKind::Other);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert_eq!(body_kind(&headers), BodyKind::Json);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));
        assert_eq!(body_kind(&headers), BodyKind::Json);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        assert_eq!(body_kind(&headers), BodyKind::Form);
    }

    #[tokio::test]
    async fn test_json_is_parsed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(1024, hits.clone())
            .oneshot(post_req("application/json", r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, r#"{"a":1}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_form_is_parsed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(1024, hits)
            .oneshot(post_req("application/x-www-form-urlencoded", "q=rust+lang&x=1"))
            .await
            .unwrap();
        assert_eq!(
            text(response).await,
            r#"[("q", "rust lang"), ("x", "1")]"#
        );
    }

    #[tokio::test]
    async fn test_oversized_body_without_length_never_reaches_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        // No Content-Length header: the limit is hit while buffering.
        let payload = format!(r#"{{"pad":"{}"}}"#, "x".repeat(64));

        let response = app(16, hits.clone())
            .oneshot(post_req("application/json", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_declared_length_rejected_for_any_type() {
        let hits = Arc::new(AtomicUsize::new(0));
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, "1000")
            .body(Body::from(vec![0u8; 1000]))
            .unwrap();

        let response = app(100, hits.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(1024, hits.clone())
            .oneshot(post_req("application/json", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, r#"{"error":"Invalid request body"}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_body_passes_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(1024, hits.clone())
            .oneshot(post_req("application/json", Body::empty()))
            .await
            .unwrap();
        assert_eq!(text(response).await, "none");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
