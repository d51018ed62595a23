//! Worker abstraction.
//!
//! # Responsibilities
//! - Represent a single registered compute worker
//! - Track liveness status (Active/Inactive)
//! - Track the last reported load percentage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Identifier a worker registers itself under.
pub type WorkerId = u32;

/// Upper bound of the load domain (percent).
pub const MAX_LOAD: u8 = 100;

/// Network address of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerAddress {
    pub host: String,
    pub port: u16,
}

impl WorkerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The same address with every loopback spelling (`localhost`, `127.x.y.z`,
    /// `::1`) folded to `127.0.0.1`, for comparing addresses from different sources.
    pub fn canonical(&self) -> WorkerAddress {
        if is_loopback(&self.host) {
            WorkerAddress::new("127.0.0.1", self.port)
        } else {
            WorkerAddress::new(self.host.to_ascii_lowercase(), self.port)
        }
    }
}

fn is_loopback(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

impl fmt::Display for WorkerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Liveness status as seen by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Active,
    Inactive,
}

impl WorkerStatus {
    pub fn is_active(self) -> bool {
        self == WorkerStatus::Active
    }
}

/// A single registered worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub address: WorkerAddress,
    pub status: WorkerStatus,
    /// Last reported load, 0-100.
    pub load: u8,
}

impl Worker {
    /// A freshly registered worker starts active and idle.
    pub fn new(id: WorkerId, address: WorkerAddress) -> Self {
        Self {
            id,
            address,
            status: WorkerStatus::Active,
            load: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Clamp a raw load report into `0..=MAX_LOAD`.
pub fn clamp_load(raw: i64) -> u8 {
    raw.clamp(0, MAX_LOAD as i64) as u8
}
