//! Path scope matching.
//!
//! Used to decide which requests a scoped middleware (such as the API rate
//! limit tier) applies to.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefix matching only, no regex
//! - A prefix ending in `/` also matches the bare path without it
//!   (`/api/` matches `/api`)

use axum::extract::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Scope covering every API route.
    pub fn api() -> Self {
        Self::new("/api/")
    }

    pub fn matches_path(&self, path: &str) -> bool {
        if path.starts_with(&self.prefix) {
            return true;
        }
        self.prefix
            .strip_suffix('/')
            .is_some_and(|bare| !bare.is_empty() && path == bare)
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request) -> bool {
        self.matches_path(req.uri().path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::api();

        let req1 = Request::builder()
            .uri("http://example.com/api/keys")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req1));

        let req2 = Request::builder()
            .uri("http://example.com/assets/app.js")
            .body(Body::default())
            .unwrap();
        assert!(!matcher.matches(&req2));
    }

    #[test]
    fn test_bare_prefix() {
        let matcher = PathPrefixMatcher::api();
        assert!(matcher.matches_path("/api"));
        assert!(!matcher.matches_path("/apis"));
        assert!(!matcher.matches_path("/API/keys"));

        let root = PathPrefixMatcher::new("/");
        assert!(root.matches_path("/anything"));
    }
}
