//! Periodic health monitor.
//!
//! # Responsibilities
//! - Periodically query the liveness source
//! - Update worker status in the registry

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::liveness::LivenessSource;
use crate::load_balancer::registry::{LivenessSummary, WorkerRegistry};
use crate::observability::metrics;

/// What happened during one health cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied(LivenessSummary),
    /// Query failed or timed out; statuses were left alone.
    Skipped,
}

pub struct HealthMonitor<L> {
    registry: Arc<WorkerRegistry>,
    source: L,
    interval: Duration,
    timeout: Duration,
}

impl<L: LivenessSource> HealthMonitor<L> {
    pub fn new(registry: Arc<WorkerRegistry>, source: L, config: &HealthCheckConfig) -> Self {
        Self {
            registry,
            source,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Health monitor starting");

        // First check one interval after startup, giving workers time to register.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Query the liveness source, then apply the result under the registry lock.
    pub async fn run_cycle(&self) -> CycleOutcome {
        // No registry lock is held while the query is in flight.
        let alive = match time::timeout(self.timeout, self.source.alive_workers()).await {
            Ok(Ok(alive)) => alive,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Liveness query failed, keeping previous statuses");
                metrics::record_health_cycle("failed", None);
                return CycleOutcome::Skipped;
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Liveness query timed out, keeping previous statuses");
                metrics::record_health_cycle("timeout", None);
                return CycleOutcome::Skipped;
            }
        };

        let summary = self.registry.apply_liveness(&alive);
        tracing::debug!(
            active = summary.active,
            inactive = summary.inactive,
            changed = summary.changed,
            "Health cycle applied"
        );
        metrics::record_health_cycle("applied", Some(summary.active));
        CycleOutcome::Applied(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::health::liveness::StaticLiveness;
    use crate::load_balancer::{WorkerAddress, WorkerStatus};

    fn statuses(registry: &WorkerRegistry) -> Vec<WorkerStatus> {
        registry.snapshot().iter().map(|w| w.status).collect()
    }

    #[tokio::test]
    async fn test_cycle_applies_and_failure_keeps_statuses() {
        let registry = Arc::new(WorkerRegistry::new());
        registry.register(1, WorkerAddress::new("localhost", 50061));
        registry.register(2, WorkerAddress::new("localhost", 50062));

        let source = StaticLiveness::new([WorkerAddress::new("localhost", 50062)]);
        let monitor = HealthMonitor::new(registry.clone(), source, &HealthCheckConfig::default());

        let outcome = monitor.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Applied(s) if s.active == 1 && s.changed == 1));
        assert_eq!(statuses(&registry), vec![WorkerStatus::Inactive, WorkerStatus::Active]);

        monitor.source.set(None);
        assert_eq!(monitor.run_cycle().await, CycleOutcome::Skipped);
        assert_eq!(statuses(&registry), vec![WorkerStatus::Inactive, WorkerStatus::Active]);

        monitor.source.set(Some(HashSet::new()));
        monitor.run_cycle().await;
        assert_eq!(statuses(&registry), vec![WorkerStatus::Inactive, WorkerStatus::Inactive]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_cycle_on_each_tick() {
        let registry = Arc::new(WorkerRegistry::new());
        registry.register(1, WorkerAddress::new("localhost", 50061));
        registry.register(2, WorkerAddress::new("localhost", 50062));

        let config = HealthCheckConfig {
            interval_secs: 10,
            ..HealthCheckConfig::default()
        };
        let source = StaticLiveness::new([WorkerAddress::new("localhost", 50062)]);
        let monitor = HealthMonitor::new(registry.clone(), source, &config);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));

        // Nothing is checked before the first interval elapses
        time::sleep(Duration::from_secs(9)).await;
        assert_eq!(statuses(&registry), vec![WorkerStatus::Active, WorkerStatus::Active]);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(statuses(&registry), vec![WorkerStatus::Inactive, WorkerStatus::Active]);

        // A worker registered later is picked up by the next tick
        registry.register(3, WorkerAddress::new("localhost", 50063));
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            statuses(&registry),
            vec![WorkerStatus::Inactive, WorkerStatus::Active, WorkerStatus::Inactive]
        );

        tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let registry = Arc::new(WorkerRegistry::new());
        let monitor = HealthMonitor::new(registry, StaticLiveness::default(), &HealthCheckConfig::default());

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor.run(rx));
        tx.send(()).unwrap();

        time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
