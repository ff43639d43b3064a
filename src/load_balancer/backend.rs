//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track active connections (for Least Connections LB)
//! - Track aliveness (flipped by health probes and dispatch outcomes)

use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::observability::metrics;

/// A single upstream server.
#[derive(Debug)]
pub struct Backend {
    /// The upstream address (scheme + host, optional base path).
    address: Url,
    /// Whether the backend is currently selectable.
    alive: RwLock<bool>,
    /// Number of currently active connections.
    active_connections: AtomicUsize,
}

impl Backend {
    /// Create a new backend. Backends start alive until probed.
    pub fn new(address: Url) -> Self {
        Self {
            address,
            alive: RwLock::new(true),
            active_connections: AtomicUsize::new(0),
        }
    }

    /// The upstream address.
    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.read()
    }

    /// Set the aliveness flag, returning the previous value.
    ///
    /// Health probes and dispatch outcomes both land here, so the
    /// `balancer_backend_alive` gauge always matches the flag.
    pub fn set_alive(&self, alive: bool) -> bool {
        let mut guard = self.alive.write();
        let previous = *guard;
        *guard = alive;
        drop(guard);

        metrics::record_backend_alive(self.address.as_str(), alive);

        if previous != alive {
            tracing::info!(backend = %self.address, alive, "Backend aliveness changed");
        } else {
            tracing::trace!(backend = %self.address, alive, "Backend aliveness confirmed");
        }
        previous
    }

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Increment the connection count, returning a guard that decrements it on drop.
    pub fn connect(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            backend: self.clone(),
        }
    }
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
pub struct ConnectionGuard {
    backend: Arc<Backend>,
}

impl ConnectionGuard {
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }
}

impl Deref for ConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.backend.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
pub(crate) fn test_backend(address: &str) -> Arc<Backend> {
    Arc::new(Backend::new(Url::parse(address).unwrap()))
}
