//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (checker.rs):
//!     Startup: one synchronous round
//!     Periodic timer
//!     → Probe every backend concurrently (bounded timeout)
//!     → Wait for all probes (round barrier)
//!     → Backend::set_alive
//!
//! Passive updates (proxy::transport):
//!     Forwarding failure → Backend::set_alive(false)
//!     Forwarding success → Backend::set_alive(true)
//! ```
//!
//! # Design Decisions
//! - A probe only checks reachability; any HTTP status counts as alive
//! - Dead backends keep being probed so they can recover
//! - Cancellation is observed between rounds; a running round completes

pub mod checker;

pub use checker::{HealthChecker, PROBE_TIMEOUT};
