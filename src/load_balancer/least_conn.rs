//! Least Connections load balancing strategy.

use crate::load_balancer::{backend::Backend, Strategy};
use std::sync::Arc;

/// Least connections selector.
/// Selects the backend with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for LeastConnections {
    fn select(&self, alive: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        // In case of tie, the first one in pool order is selected (stability)
        alive
            .iter()
            .min_by_key(|b| b.active_connections())
            .cloned()
    }

    fn name(&self) -> &'static str {
        "least_conn"
    }
}
