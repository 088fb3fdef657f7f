//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, JSON in production)
//!     → metrics.rs (admission counters)
//!
//! Consumers:
//!     → stdout (collected by the process manager)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Secrets never reach a log line; only presence flags do

pub mod logging;
pub mod metrics;
