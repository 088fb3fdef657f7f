//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, admission pipeline)
//!     → request.rs (request ID assigned and propagated)
//!     → [security layers, see security/]
//!     → [api/ routes or routing/spa.rs fallback]
//!     → response.rs (JSON error shapes, terminal error handler)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer, ServerError};
