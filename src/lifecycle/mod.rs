//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build pool → Metrics → First health round → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel health loop → Stop accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, no degraded mode
//! - Listeners start last (traffic only once aliveness is known)
//! - One process-wide cancellation token

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
