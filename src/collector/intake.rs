//! Load report intake.

use std::sync::Arc;

use crate::load_balancer::registry::WorkerRegistry;
use crate::load_balancer::worker::{WorkerId, clamp_load};
use crate::observability::metrics;

/// Accepts load reports from workers.
#[derive(Debug, Clone)]
pub struct LoadCollector {
    registry: Arc<WorkerRegistry>,
}

impl LoadCollector {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    /// Record a load report. Unknown workers are ignored.
    ///
    /// Returns whether a registered worker received the value.
    pub fn report_load(&self, id: WorkerId, raw_load: i64) -> bool {
        let load = clamp_load(raw_load);
        if i64::from(load) != raw_load {
            tracing::debug!(worker_id = id, raw_load, load, "Clamped out-of-range load report");
        }

        let known = self.registry.report_load(id, load);
        if known {
            tracing::debug!(worker_id = id, load, "Load reported");
        } else {
            tracing::debug!(worker_id = id, load, "Load report from unregistered worker ignored");
        }
        metrics::record_load_report(id, load, known);
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::WorkerAddress;

    #[test]
    fn test_report_load_clamps_and_records() {
        let registry = Arc::new(WorkerRegistry::new());
        registry.register(1, WorkerAddress::new("localhost", 50061));
        let collector = LoadCollector::new(registry.clone());

        assert!(collector.report_load(1, 55));
        assert!(collector.report_load(1, 180));
        assert!(collector.report_load(1, -3));
        assert!(!collector.report_load(2, 10));

        assert_eq!(registry.load_samples()[&1], vec![55, 100, 0]);
        assert_eq!(registry.snapshot()[0].load, 0);
    }
}
