//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, panic isolation)
//!     → proxy::Dispatcher (select, rewrite, forward with retries)
//!     → request.rs (upstream URI, X-Forwarded-*, hop-by-hop stripping)
//!     → response.rs (strip hop-by-hop, uniform error responses)
//!     → Send to client
//! ```

use axum::http::HeaderName;

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};

/// Correlation header set on every request and echoed on the response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
