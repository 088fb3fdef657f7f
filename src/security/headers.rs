//! Security response headers.
//!
//! The policy is rendered once at startup into a list of header pairs and
//! attached to every response that passes through the pipeline. It never
//! inspects or blocks the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{self, InvalidHeaderValue},
        HeaderMap, HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::config::Mode;

/// Third-party script sources.
pub const SCRIPT_SOURCES: &[&str] = &["https://cdn.jsdelivr.net", "https://cdnjs.cloudflare.com"];

/// Third-party stylesheet sources.
pub const STYLE_SOURCES: &[&str] = &["https://fonts.googleapis.com", "https://cdnjs.cloudflare.com"];

/// Third-party font sources.
pub const FONT_SOURCES: &[&str] = &["https://fonts.gstatic.com", "https://cdnjs.cloudflare.com"];

/// AI provider APIs the browser client calls directly.
pub const PROVIDER_ORIGINS: &[&str] = &[
    "https://api.groq.com",
    "https://api.perplexity.ai",
    "https://generativelanguage.googleapis.com",
];

pub const HSTS: &str = "max-age=31536000; includeSubDomains; preload";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        name: HeaderName,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Render the Content-Security-Policy for a mode.
pub fn content_security_policy(mode: Mode) -> String {
    let mut connect = vec!["'self'"];
    connect.extend_from_slice(PROVIDER_ORIGINS);
    if !mode.is_production() {
        connect.extend_from_slice(&["ws:", "wss:", "http://localhost:*"]);
    }

    let mut directives = vec![
        "default-src 'self'".to_string(),
        directive("script-src", &["'self'", "'unsafe-inline'"], SCRIPT_SOURCES),
        directive("style-src", &["'self'", "'unsafe-inline'"], STYLE_SOURCES),
        directive("font-src", &["'self'", "data:"], FONT_SOURCES),
        "img-src 'self' data: https:".to_string(),
        directive("connect-src", &connect, &[]),
        "frame-src 'none'".to_string(),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
    ];
    if mode.is_production() {
        directives.push("upgrade-insecure-requests".to_string());
    }

    directives.join("; ")
}

fn directive(name: &str, base: &[&str], extra: &[&str]) -> String {
    let sources: Vec<&str> = base.iter().chain(extra).copied().collect();
    format!("{} {}", name, sources.join(" "))
}

/// Fixed set of headers attached to every response.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityPolicy {
    pub fn for_mode(mode: Mode) -> Result<Self, PolicyError> {
        let csp = content_security_policy(mode);
        let csp = HeaderValue::from_str(&csp).map_err(|source| PolicyError::InvalidHeader {
            name: header::CONTENT_SECURITY_POLICY,
            source,
        })?;

        let headers = vec![
            (header::CONTENT_SECURITY_POLICY, csp),
            (header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS)),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ),
            (
                HeaderName::from_static("cross-origin-resource-policy"),
                HeaderValue::from_static("cross-origin"),
            ),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
            (
                HeaderName::from_static("x-permitted-cross-domain-policies"),
                HeaderValue::from_static("none"),
            ),
            (HeaderName::from_static("origin-agent-cluster"), HeaderValue::from_static("?1")),
            (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        ];

        Ok(Self { headers })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

pub async fn security_headers_middleware(
    State(policy): State<Arc<SecurityPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_csp() {
        let csp = content_security_policy(Mode::Production);
        assert!(csp.starts_with("default-src 'self'"));
        assert!(csp.contains("connect-src 'self' https://api.groq.com https://api.perplexity.ai https://generativelanguage.googleapis.com;"));
        assert!(csp.contains("frame-src 'none'"));
        assert!(csp.contains("object-src 'none'"));
        assert!(csp.contains("script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net"));
        assert!(csp.ends_with("upgrade-insecure-requests"));
        assert!(!csp.contains("ws:"));
    }

    #[test]
    fn test_development_csp_allows_dev_tooling() {
        let csp = content_security_policy(Mode::Development);
        assert!(csp.contains("ws:"));
        assert!(csp.contains("http://localhost:*"));
        assert!(!csp.contains("upgrade-insecure-requests"));
    }

    #[test]
    fn test_policy_headers() {
        let policy = SecurityPolicy::for_mode(Mode::Production).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        policy.apply(&mut headers);

        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS);
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    }
}
