//! Round-robin load balancing strategy.

use crate::load_balancer::{backend::Backend, Strategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Round-robin selector.
///
/// The counter is shared across calls and never reset, so when the alive
/// set shrinks or grows the rotation offset shifts. That skew is accepted.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn select(&self, alive: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if alive.is_empty() {
            return None;
        }

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % alive.len();
        alive.get(index).cloned()
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
