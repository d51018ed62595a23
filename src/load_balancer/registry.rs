//! Worker registry.
//!
//! # Responsibilities
//! - Keep registered workers in registration order
//! - Own the round-robin cursor and the load sample series
//! - Serialize every read and write behind a single lock

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::load_balancer::{
    Policy, select_server,
    worker::{Worker, WorkerAddress, WorkerId, WorkerStatus},
};

/// Reported load values per worker id, in arrival order.
pub type LoadSamples = BTreeMap<WorkerId, Vec<u8>>;

#[derive(Debug, Default)]
struct RegistryState {
    workers: Vec<Worker>,
    /// Index of the last worker handed out by round-robin.
    cursor: Option<usize>,
    samples: LoadSamples,
}

/// Result of applying one liveness set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivenessSummary {
    pub active: usize,
    pub inactive: usize,
    /// Workers whose status flipped during this pass.
    pub changed: usize,
}

/// In-memory table of known workers.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    state: Mutex<RegistryState>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().expect("registry mutex poisoned")
    }

    /// Append a new active, idle worker. Duplicate ids get their own slot.
    /// Returns the number of registered workers.
    pub fn register(&self, id: WorkerId, address: WorkerAddress) -> usize {
        let mut state = self.lock();
        state.workers.push(Worker::new(id, address));
        state.workers.len()
    }

    /// Mark every worker active if its address is in `alive`, inactive otherwise.
    ///
    /// Addresses are compared in canonical form, so a worker registered as
    /// `localhost` matches a liveness entry for `127.0.0.1`.
    pub fn apply_liveness(&self, alive: &HashSet<WorkerAddress>) -> LivenessSummary {
        let alive: HashSet<WorkerAddress> = alive.iter().map(WorkerAddress::canonical).collect();
        let mut state = self.lock();
        let mut summary = LivenessSummary::default();

        for worker in state.workers.iter_mut() {
            let status = if alive.contains(&worker.address.canonical()) {
                summary.active += 1;
                WorkerStatus::Active
            } else {
                summary.inactive += 1;
                WorkerStatus::Inactive
            };

            if worker.status != status {
                tracing::info!(
                    worker_id = worker.id,
                    address = %worker.address,
                    from = ?worker.status,
                    to = ?status,
                    "Worker status changed"
                );
                summary.changed += 1;
                worker.status = status;
            }
        }

        summary
    }

    /// Record a load report for the first worker registered under `id`.
    ///
    /// Returns `false` and changes nothing when no such worker exists.
    pub fn report_load(&self, id: WorkerId, load: u8) -> bool {
        let mut state = self.lock();
        let Some(worker) = state.workers.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        worker.load = load;
        state.samples.entry(id).or_default().push(load);
        true
    }

    /// Select a worker under `policy`, advancing the cursor.
    pub fn select(&self, policy: Policy) -> Option<Worker> {
        let mut state = self.lock();
        let selection = select_server(&state.workers, state.cursor, policy);
        state.cursor = selection.cursor;
        selection.index.map(|i| state.workers[i].clone())
    }

    /// Point-in-time copy of the worker table.
    pub fn snapshot(&self) -> Vec<Worker> {
        self.lock().workers.clone()
    }

    /// Copy of every load sample received so far.
    pub fn load_samples(&self) -> LoadSamples {
        self.lock().samples.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn cursor(&self) -> Option<usize> {
        self.lock().cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(port: u16) -> WorkerAddress {
        WorkerAddress::new("localhost", port)
    }

    fn registry_with(ids: &[WorkerId]) -> WorkerRegistry {
        let registry = WorkerRegistry::new();
        for &id in ids {
            registry.register(id, addr(50060 + id as u16));
        }
        registry
    }

    fn ids(picks: impl IntoIterator<Item = Option<Worker>>) -> Vec<Option<WorkerId>> {
        picks.into_iter().map(|w| w.map(|w| w.id)).collect()
    }

    #[test]
    fn test_end_to_end_policies() {
        let registry = registry_with(&[1, 2, 3]);
        let picks = ids((0..4).map(|_| registry.select(Policy::RoundRobin)));
        assert_eq!(picks, vec![Some(1), Some(2), Some(3), Some(1)]);

        registry.report_load(1, 10);
        registry.report_load(2, 5);
        registry.report_load(3, 5);
        assert_eq!(registry.select(Policy::LeastLoaded).map(|w| w.id), Some(2));

        let alive = HashSet::from([addr(50062), addr(50063)]);
        registry.apply_liveness(&alive);
        assert_eq!(registry.select(Policy::PickFirst).map(|w| w.id), Some(2));
    }

    #[test]
    fn test_unavailable_when_empty_or_all_inactive() {
        let registry = WorkerRegistry::new();
        for policy in [Policy::RoundRobin, Policy::LeastLoaded, Policy::PickFirst] {
            assert!(registry.select(policy).is_none());
        }
        assert_eq!(registry.cursor(), None);

        let registry = registry_with(&[1, 2]);
        registry.apply_liveness(&HashSet::new());
        for policy in [Policy::RoundRobin, Policy::LeastLoaded, Policy::PickFirst] {
            assert!(registry.select(policy).is_none());
        }
    }

    #[test]
    fn test_report_load_known_and_unknown() {
        let registry = registry_with(&[1]);

        assert!(registry.report_load(1, 37));
        assert!(registry.report_load(1, 12));
        assert_eq!(registry.snapshot()[0].load, 12);
        assert_eq!(registry.load_samples()[&1], vec![37, 12]);

        let before = registry.snapshot();
        assert!(!registry.report_load(9, 50));
        assert_eq!(registry.snapshot(), before);
        assert!(!registry.load_samples().contains_key(&9));
    }

    #[test]
    fn test_duplicate_ids_are_separate_slots() {
        let registry = registry_with(&[4, 4]);
        assert_eq!(registry.len(), 2);

        // Only the first slot receives the load
        registry.report_load(4, 90);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].load, 90);
        assert_eq!(snapshot[1].load, 0);

        let picks = ids((0..2).map(|_| registry.select(Policy::RoundRobin)));
        assert_eq!(picks, vec![Some(4), Some(4)]);
        assert_eq!(registry.select(Policy::LeastLoaded).map(|w| w.load), Some(0));
    }

    #[test]
    fn test_liveness_is_idempotent() {
        let registry = registry_with(&[1, 2, 3]);
        let alive = HashSet::from([addr(50061), addr(50063)]);

        let first = registry.apply_liveness(&alive);
        let after_first = registry.snapshot();
        let second = registry.apply_liveness(&alive);

        assert_eq!(registry.snapshot(), after_first);
        assert_eq!(first.changed, 1);
        assert_eq!(second.changed, 0);
        assert_eq!((second.active, second.inactive), (2, 1));
    }

    #[test]
    fn test_liveness_matches_host_and_port() {
        let registry = WorkerRegistry::new();
        registry.register(1, WorkerAddress::new("10.0.0.1", 7000));
        registry.apply_liveness(&HashSet::from([WorkerAddress::new("10.0.0.2", 7000)]));
        assert_eq!(registry.snapshot()[0].status, WorkerStatus::Inactive);
    }

    #[test]
    fn test_liveness_matches_loopback_spellings() {
        let registry = WorkerRegistry::new();
        registry.register(1, WorkerAddress::new("localhost", 7001));
        registry.register(2, WorkerAddress::new("127.0.0.1", 7002));
        registry.register(3, WorkerAddress::new("localhost", 7003));

        let alive = HashSet::from([
            WorkerAddress::new("127.0.0.1", 7001),
            WorkerAddress::new("localhost", 7002),
        ]);
        let summary = registry.apply_liveness(&alive);

        assert_eq!((summary.active, summary.inactive), (2, 1));
        let statuses: Vec<_> = registry.snapshot().iter().map(|w| w.status).collect();
        assert_eq!(statuses, vec![WorkerStatus::Active, WorkerStatus::Active, WorkerStatus::Inactive]);
        // Stored addresses keep their registered spelling
        assert_eq!(registry.snapshot()[0].address.host, "localhost");
    }

    #[test]
    fn test_status_and_load_leave_identity_alone() {
        let registry = registry_with(&[5]);
        registry.report_load(5, 64);
        registry.apply_liveness(&HashSet::new());

        let w = &registry.snapshot()[0];
        assert_eq!(w.id, 5);
        assert_eq!(w.address, addr(50065));
        assert_eq!(w.load, 64);
        assert_eq!(w.status, WorkerStatus::Inactive);
    }

    #[test]
    fn test_concurrent_updates() {
        let registry = Arc::new(registry_with(&[1, 2, 3, 4]));
        let mut handles = Vec::new();

        for t in 0..4u32 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..250u32 {
                    registry.report_load(t + 1, (i % 100) as u8);
                    let _ = registry.select(Policy::RoundRobin);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let samples = registry.load_samples();
        for id in 1..=4 {
            assert_eq!(samples[&id].len(), 250);
        }
        let cursor = registry.cursor().unwrap();
        assert!(cursor < registry.len());
    }
}
