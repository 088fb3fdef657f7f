//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (body ceiling, JSON / form decoding)
//!     → headers.rs (security headers attached on the way out)
//!     → client_ip.rs (resolve client identity)
//!     → rate_limit.rs (global tier, then `/api/` tier)
//!     → Pass to compression and routing
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any admission check failure
//! - No trust in client input (forwarded headers only when configured)

pub mod client_ip;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use client_ip::ClientIp;
pub use headers::SecurityPolicy;
pub use limits::{BodyLimits, ParsedBody};
pub use rate_limit::{RateLimitTier, RateLimiter};
