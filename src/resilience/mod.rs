//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding attempt fails (transport error):
//!     → retries.rs (is there budget left?)
//!     → backoff.rs (how long to wait before the next attempt)
//!     → proxy::transport re-selects a backend and tries again
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; any HTTP status is a response
//! - Fixed retry budget per request, no cross-request retry accounting

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
