//! Active health checking.
//!
//! # Responsibilities
//! - Probe every backend (alive or not) once per round
//! - Update backend aliveness from probe results
//! - Repeat on a fixed interval until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::load_balancer::{backend::Backend, BackendPool};

/// Upper bound on a single probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HealthChecker {
    pool: Arc<BackendPool>,
    client: Client<HttpConnector, Body>,
    interval: Duration,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(pool: Arc<BackendPool>, interval: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            pool,
            client,
            interval,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Override the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one round synchronously, then spawn the periodic loop.
    ///
    /// The first round completes before this returns so that the first
    /// requests already see probed aliveness.
    pub async fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.check_round().await;
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            backends = self.pool.len(),
            "Health checker starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Health checker received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.check_round().await;
                }
            }
        }
    }

    /// Probe every registered backend concurrently and wait for all probes.
    pub async fn check_round(&self) {
        let mut probes = JoinSet::new();

        for backend in self.pool.all_backends() {
            let client = self.client.clone();
            let timeout = self.timeout;
            probes.spawn(async move {
                let alive = probe(&client, &backend, timeout).await;
                backend.set_alive(alive);
            });
        }

        while let Some(result) = probes.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Health probe task failed");
            }
        }
    }
}

/// Any response counts as reachable; only transport failures mark a backend dead.
async fn probe(client: &Client<HttpConnector, Body>, backend: &Backend, timeout: Duration) -> bool {
    let addr = backend.address();
    let uri: Uri = match addr.as_str().parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(backend = %addr, error = %e, "Backend address is not a valid URI");
            return false;
        }
    };

    let request = match Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("user-agent", "http-balancer-health-check")
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(backend = %addr, error = %e, "Failed to build health check request");
            return false;
        }
    };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            tracing::debug!(backend = %addr, status = %response.status(), "Health check reachable");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %addr, error = %e, "Health check failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %addr, "Health check failed: timeout");
            false
        }
    }
}
