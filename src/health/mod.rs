//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (monitor.rs)
//!     → Query liveness source (liveness.rs), no registry lock held
//!     → Take registry lock
//!     → Active if address is alive, Inactive otherwise
//! ```
//!
//! # Design Decisions
//! - The liveness source is pluggable (Consul adapter, static set)
//! - A failed or slow query skips the cycle; previous statuses stay
//! - No hysteresis: the liveness source already debounces its own checks

pub mod liveness;
pub mod monitor;

pub use liveness::{ConsulLiveness, LivenessError, LivenessSource, StaticLiveness};
pub use monitor::{CycleOutcome, HealthMonitor};
