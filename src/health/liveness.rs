//! Liveness sources.
//!
//! A liveness source answers one question: which worker addresses are
//! currently healthy. The balancer does not care where the answer comes from.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use serde::Deserialize;
use thiserror::Error;

use crate::load_balancer::WorkerAddress;

#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("liveness query failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("liveness source returned status {0}")]
    Status(u16),
    #[error("liveness source unavailable")]
    Unavailable,
}

/// Capability to list currently alive worker addresses.
pub trait LivenessSource: Send + Sync + 'static {
    fn alive_workers(&self) -> impl Future<Output = Result<HashSet<WorkerAddress>, LivenessError>> + Send;
}

/// Consul health API adapter (`/v1/health/service/<name>`).
#[derive(Debug, Clone)]
pub struct ConsulLiveness {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    #[serde(default)]
    node: Option<NodeInfo>,
    service: ServiceInfo,
    #[serde(default)]
    checks: Vec<CheckInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeInfo {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInfo {
    #[serde(default)]
    address: String,
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CheckInfo {
    status: String,
}

impl ConsulLiveness {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LivenessError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl LivenessSource for ConsulLiveness {
    async fn alive_workers(&self) -> Result<HashSet<WorkerAddress>, LivenessError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LivenessError::Status(status.as_u16()));
        }
        let entries: Vec<ServiceEntry> = response.json().await?;
        Ok(passing_addresses(entries))
    }
}

/// Addresses of entries whose checks are all passing.
///
/// An empty service address means the service listens on its node address.
fn passing_addresses(entries: Vec<ServiceEntry>) -> HashSet<WorkerAddress> {
    entries
        .into_iter()
        .filter(|e| e.checks.iter().all(|c| c.status == "passing"))
        .map(|e| {
            let host = if e.service.address.is_empty() {
                e.node.map(|n| n.address).unwrap_or_default()
            } else {
                e.service.address
            };
            WorkerAddress::new(host, e.service.port)
        })
        .collect()
}

/// Fixed, externally controlled liveness set.
///
/// Useful for static deployments and tests. `None` simulates an
/// unreachable source.
#[derive(Debug, Default)]
pub struct StaticLiveness {
    alive: Mutex<Option<HashSet<WorkerAddress>>>,
}

impl StaticLiveness {
    pub fn new(alive: impl IntoIterator<Item = WorkerAddress>) -> Self {
        Self {
            alive: Mutex::new(Some(alive.into_iter().collect())),
        }
    }

    /// Replace the alive set; `None` makes the next queries fail.
    pub fn set(&self, alive: Option<HashSet<WorkerAddress>>) {
        *self.alive.lock().expect("liveness mutex poisoned") = alive;
    }
}

impl LivenessSource for StaticLiveness {
    async fn alive_workers(&self) -> Result<HashSet<WorkerAddress>, LivenessError> {
        self.alive
            .lock()
            .expect("liveness mutex poisoned")
            .clone()
            .ok_or(LivenessError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::{WorkerRegistry, WorkerStatus};

    #[test]
    fn test_passing_addresses() {
        let body = r#"[
            {
                "Node": {"Node": "n1", "Address": "10.0.0.5"},
                "Service": {"ID": "w-1", "Service": "worker", "Address": "localhost", "Port": 50061},
                "Checks": [{"CheckID": "serfHealth", "Status": "passing"}, {"CheckID": "service:w-1", "Status": "passing"}]
            },
            {
                "Node": {"Node": "n1", "Address": "10.0.0.5"},
                "Service": {"ID": "w-2", "Service": "worker", "Address": "localhost", "Port": 50062},
                "Checks": [{"CheckID": "serfHealth", "Status": "passing"}, {"CheckID": "service:w-2", "Status": "critical"}]
            },
            {
                "Node": {"Node": "n1", "Address": "10.0.0.5"},
                "Service": {"ID": "w-3", "Service": "worker", "Address": "", "Port": 50063},
                "Checks": []
            }
        ]"#;

        let entries: Vec<ServiceEntry> = serde_json::from_str(body).unwrap();
        let alive = passing_addresses(entries);

        assert_eq!(alive.len(), 2);
        assert!(alive.contains(&WorkerAddress::new("localhost", 50061)));
        assert!(alive.contains(&WorkerAddress::new("10.0.0.5", 50063)));
    }

    #[test]
    fn test_node_address_fallback_matches_localhost_worker() {
        let body = r#"[
            {
                "Node": {"Node": "n1", "Address": "127.0.0.1"},
                "Service": {"ID": "w-1", "Service": "worker", "Address": "", "Port": 50061},
                "Checks": [{"CheckID": "serfHealth", "Status": "passing"}, {"CheckID": "service:w-1", "Status": "passing"}]
            }
        ]"#;
        let entries: Vec<ServiceEntry> = serde_json::from_str(body).unwrap();
        let alive = passing_addresses(entries);

        let registry = WorkerRegistry::new();
        registry.register(1, WorkerAddress::new("localhost", 50061));
        registry.apply_liveness(&alive);

        assert_eq!(registry.snapshot()[0].status, WorkerStatus::Active);
    }

    #[tokio::test]
    async fn test_static_liveness() {
        let source = StaticLiveness::new([WorkerAddress::new("localhost", 1)]);
        assert_eq!(source.alive_workers().await.unwrap().len(), 1);

        source.set(None);
        assert!(matches!(source.alive_workers().await, Err(LivenessError::Unavailable)));
    }
}
