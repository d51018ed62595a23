//! Pick-first selection strategy.

use crate::load_balancer::{Selection, Selector, worker::Worker};

/// Always the first active worker in registration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PickFirst;

impl PickFirst {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for PickFirst {
    fn select(&self, workers: &[Worker], cursor: Option<usize>) -> Selection {
        Selection {
            index: workers.iter().position(Worker::is_active),
            cursor,
        }
    }
}
