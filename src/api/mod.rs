//! JSON endpoints under `/api/`.
//!
//! - `GET /api/health`: liveness signal
//! - `GET /api/keys`: provider credentials for allow-listed origins

pub mod health;
pub mod keys;
pub mod origin;

use axum::{routing::get, Router};

use crate::http::server::AppState;

pub use origin::OriginPolicy;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::get_health))
        .route("/api/keys", get(keys::get_keys))
}
