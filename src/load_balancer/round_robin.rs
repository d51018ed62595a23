//! Round-robin selection.

use crate::load_balancer::{Selection, Selector, worker::Worker};

/// Round-robin selector.
/// Scans forward from the slot after the cursor and wraps around once.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for RoundRobin {
    fn select(&self, workers: &[Worker], cursor: Option<usize>) -> Selection {
        if workers.is_empty() {
            return Selection::none(cursor);
        }

        let len = workers.len();
        let start = cursor.map_or(0, |c| (c + 1) % len);

        for i in 0..len {
            let index = (start + i) % len;
            if workers[index].is_active() {
                return Selection::found(index, Some(index));
            }
        }

        // Nothing active: the cursor rests on the last slot visited.
        Selection::none(Some((start + len - 1) % len))
    }
}
