//! Balancer front end.
//!
//! # Responsibilities
//! - Register workers
//! - Answer "which server should I use" under the active policy
//! - Allow the policy to be swapped at runtime (config reload)

use std::sync::Arc;
use arc_swap::ArcSwap;
use thiserror::Error;

use crate::load_balancer::{
    Policy,
    registry::WorkerRegistry,
    worker::{Worker, WorkerAddress, WorkerId},
};
use crate::observability::metrics;

/// Message returned to callers when no worker can be selected.
pub const NO_SERVERS_AVAILABLE: &str = "No servers available";

/// No active worker could be selected.
///
/// This is an expected outcome, not a fault; callers decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", NO_SERVERS_AVAILABLE)]
pub struct Unavailable;

/// Address and identity of a selected worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub id: WorkerId,
    pub address: WorkerAddress,
}

impl From<Worker> for ServerInfo {
    fn from(w: Worker) -> Self {
        Self {
            id: w.id,
            address: w.address,
        }
    }
}

#[derive(Debug)]
pub struct BalancerService {
    registry: Arc<WorkerRegistry>,
    policy: ArcSwap<Policy>,
}

impl BalancerService {
    pub fn new(registry: Arc<WorkerRegistry>, policy: Policy) -> Self {
        Self {
            registry,
            policy: ArcSwap::from_pointee(policy),
        }
    }

    pub fn register_worker(&self, id: WorkerId, address: WorkerAddress) {
        tracing::info!(worker_id = id, address = %address, "Register worker request received");
        let registered = self.registry.register(id, address);
        metrics::record_registration(registered);
        tracing::info!(worker_id = id, registered, "Worker registered successfully");
    }

    pub fn get_server(&self) -> Result<ServerInfo, Unavailable> {
        let policy = self.policy();
        let selected = self.registry.select(policy);
        metrics::record_selection(policy, selected.is_some());

        match selected {
            Some(worker) => {
                tracing::info!(worker_id = worker.id, address = %worker.address, %policy, "Server found");
                Ok(worker.into())
            }
            None if self.registry.is_empty() => {
                tracing::warn!(%policy, "No servers available, no workers registered");
                Err(Unavailable)
            }
            None => {
                tracing::warn!(%policy, registered = self.registry.len(), "No servers available");
                Err(Unavailable)
            }
        }
    }

    pub fn policy(&self) -> Policy {
        **self.policy.load()
    }

    /// Swap the selection policy. The round-robin cursor is kept.
    pub fn set_policy(&self, policy: Policy) {
        let previous = self.policy();
        if previous != policy {
            self.policy.store(Arc::new(policy));
            tracing::info!(from = %previous, to = %policy, "Selection policy changed");
        }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }
}
