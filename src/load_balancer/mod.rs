//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the proxy
//!     → pool.rs (snapshot of alive backends)
//!     → Apply the active strategy:
//!         - round_robin.rs (rotate through backends)
//!         - random.rs (uniform pick)
//!         - least_conn.rs (pick backend with fewest connections)
//!     → backend.rs (connection guard for bookkeeping)
//!     → Return backend or None
//! ```
//!
//! # Design Decisions
//! - Strategies only ever see the alive snapshot, never dead backends
//! - The pool owns every backend; strategies borrow `Arc` handles
//! - The active strategy is swappable at runtime

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod random;
pub mod round_robin;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use self::backend::Backend;
use self::least_conn::LeastConnections;
use self::random::Random;
use self::round_robin::RoundRobin;

pub use self::pool::{BackendPool, PoolError};

/// A backend selection algorithm.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Pick one backend from the alive snapshot, or `None` if it is empty.
    fn select(&self, alive: &[Arc<Backend>]) -> Option<Arc<Backend>>;

    /// Name used in logs and the admin API.
    fn name(&self) -> &'static str;
}

/// Configured algorithm name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    RoundRobin,
    Random,
    LeastConn,
}

impl Algorithm {
    /// Construct a fresh strategy for this algorithm.
    pub fn build(self) -> Arc<dyn Strategy> {
        match self {
            Algorithm::RoundRobin => Arc::new(RoundRobin::new()),
            Algorithm::Random => Arc::new(Random::new()),
            Algorithm::LeastConn => Arc::new(LeastConnections::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round_robin",
            Algorithm::Random => "random",
            Algorithm::LeastConn => "least_conn",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an algorithm name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown balancing algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(Algorithm::RoundRobin),
            "random" => Ok(Algorithm::Random),
            "least_conn" => Ok(Algorithm::LeastConn),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}
