//! Static asset serving with single-page-application fallback.
//!
//! Files under the asset root are served as-is (conditional requests, ranges
//! and `Last-Modified` come from `ServeDir`). Any path that does not resolve to
//! a file gets the entry document with a 200 so the client router can take over.

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::StaticConfig;

/// Install the asset service as the router's fallback.
///
/// Must be called after every API route is registered: axum consults the
/// fallback only when no explicit route matched.
pub fn attach(router: Router, config: &StaticConfig) -> Router {
    let index = config.index_path();

    if index.is_file() {
        tracing::info!(root = %config.root.display(), "Serving static assets");
    } else {
        tracing::warn!(
            path = %index.display(),
            "SPA entry document not found; unmatched paths will return 404 until it exists"
        );
    }

    let assets = ServeDir::new(&config.root)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(index));

    router.fallback_service(assets)
}
