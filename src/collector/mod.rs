//! Load collection subsystem.
//!
//! # Data Flow
//! ```text
//! Worker load report (POST /v1/load on the load listener)
//!     → intake.rs (clamp, update registry, append sample)
//!     → metrics (per-worker load gauge)
//!
//! On shutdown:
//!     → persist.rs (dump every sample series to JSON)
//! ```

pub mod intake;
pub mod persist;

pub use intake::LoadCollector;
pub use persist::{PersistError, flush_load_samples};
