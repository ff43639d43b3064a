//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::load_balancer::Algorithm;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Port the proxy listener binds to on all interfaces.
    pub listen_port: u16,

    /// Backend selection algorithm. Unknown names fail deserialization.
    pub algorithm: Algorithm,

    /// Upstream addresses (e.g., "http://127.0.0.1:3000").
    pub backends: Vec<String>,

    /// Seconds between health check rounds.
    pub health_check_interval: u64,

    /// Largest request body buffered for retries, in bytes. Larger bodies
    /// are streamed with a single attempt.
    pub max_body_bytes: usize,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            algorithm: Algorithm::RoundRobin,
            backends: Vec::new(),
            health_check_interval: 10,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl BalancerConfig {
    /// Listener bind address derived from `listen_port`.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
