//! Shutdown coordination.

use std::path::Path;
use tokio::sync::broadcast;

use crate::collector::flush_load_samples;
use crate::load_balancer::WorkerRegistry;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Persist the load sample series, logging the outcome.
///
/// Returns whether the file was written.
pub fn persist_load_samples(registry: &WorkerRegistry, path: &Path) -> bool {
    tracing::info!(path = ?path, "Shutting down, saving load data");
    let samples = registry.load_samples();
    match flush_load_samples(&samples, path) {
        Ok(()) => {
            tracing::info!(workers = samples.len(), "Load data saved successfully");
            true
        }
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Failed to save load data");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::WorkerAddress;

    #[test]
    fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
    }

    #[test]
    fn test_persist_load_samples() {
        let registry = WorkerRegistry::new();
        registry.register(2, WorkerAddress::new("localhost", 50062));
        registry.report_load(2, 33);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("load.json");
        assert!(persist_load_samples(&registry, &path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"2":[33]}"#);

        // Parent is a regular file
        assert!(!persist_load_samples(&registry, &path.join("load.json")));
    }
}
