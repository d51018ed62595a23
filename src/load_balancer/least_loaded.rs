//! Least-loaded selection strategy.

use crate::load_balancer::{Selection, Selector, worker::Worker};

/// Least-loaded selector.
/// Selects the active worker with the lowest reported load.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastLoaded;

impl LeastLoaded {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for LeastLoaded {
    fn select(&self, workers: &[Worker], cursor: Option<usize>) -> Selection {
        // min_by_key keeps the first of several equal minima.
        let index = workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_active())
            .min_by_key(|(_, w)| w.load)
            .map(|(i, _)| i);

        Selection { index, cursor }
    }
}
