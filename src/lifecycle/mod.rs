//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Bind listeners → Spawn health monitor → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop health monitor → Flush load samples → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup: config and bind errors are fatal
//! - Load sample flush on shutdown is best-effort; failure is logged, not fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
