//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request
//!     → explicit API routes (api/)
//!     → no match: spa.rs (static file, else entry document)
//!
//! Scoped middleware:
//!     matcher.rs decides whether a path falls under a scope (e.g. `/api/`)
//! ```
//!
//! # Design Decisions
//! - API routes are registered before the fallback and can never be shadowed
//! - No regex in hot path (prefix matching only)

pub mod matcher;
pub mod spa;

pub use matcher::{Matcher, PathPrefixMatcher};
