//! Random load balancing strategy.

use crate::load_balancer::{backend::Backend, Strategy};
use rand::Rng;
use std::sync::Arc;

/// Uniform random selector. Stateless.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for Random {
    fn select(&self, alive: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if alive.is_empty() {
            return None;
        }

        let index = rand::thread_rng().gen_range(0..alive.len());
        alive.get(index).cloned()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
