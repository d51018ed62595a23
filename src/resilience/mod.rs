//! Resilience subsystem.
//!
//! # Design Decisions
//! - The balancer core never retries: "no servers available" goes straight to the caller
//! - Workers retry registration with exponential backoff until the balancer answers

pub mod backoff;

pub use backoff::Backoff;
