//! SPA edge server library.
//!
//! Serves a single-page application's static bundle behind an admission
//! pipeline (body limits, security headers, tiered rate limiting,
//! compression) and exposes `/api/health` and `/api/keys`.

pub mod api;
pub mod config;
pub mod credentials;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
