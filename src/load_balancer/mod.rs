//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Worker registers → registry.rs (append to ordered table)
//! Client asks for a server
//!     → registry.rs (take lock, hand workers + cursor to the selector)
//!     → Apply selection policy:
//!         - round_robin.rs (rotate from the cursor)
//!         - least_loaded.rs (lowest reported load)
//!         - pick_first.rs (first active worker)
//!     → Store new cursor, return worker or "no servers available"
//! ```
//!
//! # Design Decisions
//! - Selectors are stateless; the registry owns the round-robin cursor
//! - One coarse lock over workers, cursor and load samples
//! - Inactive workers are excluded from selection but never removed

pub mod least_loaded;
pub mod pick_first;
pub mod registry;
pub mod round_robin;
pub mod service;
pub mod worker;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use self::least_loaded::LeastLoaded;
use self::pick_first::PickFirst;
use self::round_robin::RoundRobin;
use self::worker::Worker;

pub use registry::WorkerRegistry;
pub use service::{BalancerService, NO_SERVERS_AVAILABLE, ServerInfo, Unavailable};
pub use worker::{WorkerAddress, WorkerId, WorkerStatus};

/// Outcome of one selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Index of the chosen worker, if any is active.
    pub index: Option<usize>,
    /// Cursor to persist for the next round-robin pass.
    pub cursor: Option<usize>,
}

impl Selection {
    pub fn found(index: usize, cursor: Option<usize>) -> Self {
        Self {
            index: Some(index),
            cursor,
        }
    }

    pub fn none(cursor: Option<usize>) -> Self {
        Self {
            index: None,
            cursor,
        }
    }
}

/// A worker selection strategy.
pub trait Selector: Send + Sync {
    fn select(&self, workers: &[Worker], cursor: Option<usize>) -> Selection;
}

/// Selection policy configured on the balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Policy {
    #[default]
    #[serde(rename = "rr")]
    RoundRobin,
    #[serde(rename = "ll")]
    LeastLoaded,
    #[serde(rename = "pf")]
    PickFirst,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::RoundRobin => "rr",
            Policy::LeastLoaded => "ll",
            Policy::PickFirst => "pf",
        }
    }

    fn selector(self) -> &'static dyn Selector {
        match self {
            Policy::RoundRobin => &RoundRobin,
            Policy::LeastLoaded => &LeastLoaded,
            Policy::PickFirst => &PickFirst,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rr" => Ok(Policy::RoundRobin),
            "ll" => Ok(Policy::LeastLoaded),
            "pf" => Ok(Policy::PickFirst),
            other => Err(format!("unknown policy '{}', expected rr, ll or pf", other)),
        }
    }
}

/// Pick a worker from `workers` under `policy`.
///
/// An empty table never yields a worker and leaves the cursor untouched.
pub fn select_server(workers: &[Worker], cursor: Option<usize>, policy: Policy) -> Selection {
    if workers.is_empty() {
        return Selection::none(cursor);
    }
    policy.selector().select(workers, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("rr".parse::<Policy>().unwrap(), Policy::RoundRobin);
        assert_eq!("ll".parse::<Policy>().unwrap(), Policy::LeastLoaded);
        assert_eq!("pf".parse::<Policy>().unwrap(), Policy::PickFirst);
        assert!("random".parse::<Policy>().is_err());
    }

    #[test]
    fn test_empty_table_under_every_policy() {
        for policy in [Policy::RoundRobin, Policy::LeastLoaded, Policy::PickFirst] {
            let s = select_server(&[], Some(3), policy);
            assert_eq!(s, Selection::none(Some(3)), "policy {}", policy);
        }
    }
}
