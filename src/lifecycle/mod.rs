//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Log summary → Metrics → Bind → Serve under supervisor.rs
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Faults (supervisor.rs):
//!     Server error or panic → Log → Exit non-zero
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup or serving fault is fatal
//! - Restarts are the process manager's job

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::Outcome;
