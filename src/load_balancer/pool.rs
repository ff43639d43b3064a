//! Backend pool management.
//!
//! # Responsibilities
//! - Own every backend for the lifetime of the process
//! - Hold the active load balancing strategy (swappable at runtime)
//! - Hand out alive snapshots and selections

use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

use crate::load_balancer::{backend::Backend, Algorithm, Strategy};

/// Error raised while building the pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid backend address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Owns the backend set and the active strategy.
#[derive(Debug)]
pub struct BackendPool {
    /// Fixed membership after construction.
    backends: Vec<Arc<Backend>>,
    strategy: RwLock<Arc<dyn Strategy>>,
}

impl BackendPool {
    /// Parse every address and build the pool with round-robin selection.
    ///
    /// Any malformed address fails the whole call; no partial pool is built.
    pub fn register<I, S>(addresses: I) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let backends = addresses
            .into_iter()
            .map(|address| parse_address(address.as_ref()).map(|url| Arc::new(Backend::new(url))))
            .collect::<Result<Vec<_>, _>>()?;

        for backend in &backends {
            tracing::debug!(backend = %backend.address(), "Backend registered");
        }

        Ok(Self {
            backends,
            strategy: RwLock::new(Algorithm::default().build()),
        })
    }

    /// Builder-style strategy assignment used at startup.
    pub fn with_strategy(self, strategy: Arc<dyn Strategy>) -> Self {
        self.set_strategy(strategy);
        self
    }

    /// Replace the active strategy; effective for the next selection.
    pub fn set_strategy(&self, strategy: Arc<dyn Strategy>) {
        let name = strategy.name();
        let previous = std::mem::replace(&mut *self.strategy.write(), strategy);
        tracing::info!(from = previous.name(), to = name, "Balancing strategy set");
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.read().name()
    }

    /// Independent copy of the currently alive backends, in pool order.
    pub fn snapshot_alive(&self) -> Vec<Arc<Backend>> {
        self.backends
            .iter()
            .filter(|b| b.is_alive())
            .cloned()
            .collect()
    }

    /// Return a list of all backends (for health checking).
    pub fn all_backends(&self) -> Vec<Arc<Backend>> {
        self.backends.clone()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Select an alive backend with the active strategy.
    pub fn next_backend(&self) -> Option<Arc<Backend>> {
        let strategy = self.strategy.read().clone();
        let alive = self.snapshot_alive();
        if alive.is_empty() {
            tracing::debug!(backend_count = self.backends.len(), "No alive backends");
            return None;
        }
        strategy.select(&alive)
    }
}

fn parse_address(address: &str) -> Result<Url, PoolError> {
    let invalid = |reason: String| PoolError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(addresses: &[&str], algorithm: Algorithm) -> BackendPool {
        BackendPool::register(addresses).unwrap().with_strategy(algorithm.build())
    }

    #[test]
    fn test_register_rejects_malformed_addresses() {
        for bad in ["not a url", "https://secure:443", "ftp://files", "http://"] {
            let result = BackendPool::register(["http://127.0.0.1:9000", bad]);
            assert!(
                matches!(result, Err(PoolError::InvalidAddress { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_register_keeps_order() {
        let pool = pool(&["http://a:1", "http://b:2", "http://c:3"], Algorithm::RoundRobin);
        let hosts: Vec<_> = pool
            .all_backends()
            .iter()
            .map(|b| b.address().host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, ["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let pool = pool(&["http://a:1", "http://b:2"], Algorithm::RoundRobin);
        let mut snapshot = pool.snapshot_alive();
        snapshot.reverse();
        snapshot.pop();
        assert_eq!(pool.snapshot_alive().len(), 2);
        assert_eq!(pool.snapshot_alive()[0].address().host_str(), Some("a"));
    }

    #[test]
    fn test_round_robin_scenario() {
        let pool = pool(&["http://a:1", "http://b:2", "http://c:3"], Algorithm::RoundRobin);
        let picks: Vec<_> = (0..4)
            .map(|_| pool.next_backend().unwrap().address().host_str().unwrap().to_string())
            .collect();
        assert_eq!(picks, ["a", "b", "c", "a"]);

        pool.all_backends()[1].set_alive(false);

        // The counter keeps running over the shrunk set: 4 % 2 selects index 0.
        let next = pool.next_backend().unwrap();
        assert_eq!(next.address().host_str(), Some("a"));
        let after = pool.next_backend().unwrap();
        assert_eq!(after.address().host_str(), Some("c"));
    }

    #[test]
    fn test_least_conn_scenario() {
        let pool = pool(&["http://a:1", "http://b:2"], Algorithm::LeastConn);
        let a = pool.all_backends()[0].clone();
        let _g1 = a.connect();
        let _g2 = a.connect();

        assert_eq!(pool.next_backend().unwrap().address().host_str(), Some("b"));
    }

    #[test]
    fn test_never_selects_dead_backend() {
        for alg in [Algorithm::RoundRobin, Algorithm::Random, Algorithm::LeastConn] {
            let pool = pool(&["http://a:1", "http://b:2", "http://c:3"], alg);
            pool.all_backends()[0].set_alive(false);
            pool.all_backends()[2].set_alive(false);
            for _ in 0..20 {
                let picked = pool.next_backend().unwrap();
                assert!(picked.is_alive());
                assert_eq!(picked.address().host_str(), Some("b"));
            }
        }
    }

    #[test]
    fn test_none_iff_no_alive_backend() {
        for alg in [Algorithm::RoundRobin, Algorithm::Random, Algorithm::LeastConn] {
            let pool = pool(&["http://a:1", "http://b:2"], alg);
            assert!(pool.next_backend().is_some());

            for b in pool.all_backends() {
                b.set_alive(false);
            }
            assert!(pool.next_backend().is_none());

            pool.all_backends()[1].set_alive(true);
            assert!(pool.next_backend().is_some());
        }

        let empty = BackendPool::register(Vec::<String>::new()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.next_backend().is_none());
    }

    #[test]
    fn test_set_strategy_takes_effect_next_call() {
        let pool = pool(&["http://a:1", "http://b:2"], Algorithm::RoundRobin);
        assert_eq!(pool.strategy_name(), "round_robin");

        let _g = pool.all_backends()[0].connect();
        pool.set_strategy(Algorithm::LeastConn.build());
        assert_eq!(pool.strategy_name(), "least_conn");
        for _ in 0..3 {
            assert_eq!(pool.next_backend().unwrap().address().host_str(), Some("b"));
        }
    }
}
