//! Upstream transports.
//!
//! `Transport` performs one upstream round trip. `RetryingTransport` wraps
//! one with the retry policy: it re-selects a backend before every retry,
//! waits for the linear backoff, and flips backend aliveness on each outcome.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::load_balancer::{backend::Backend, BackendPool};
use crate::observability::metrics;
use crate::proxy::rewrite::OutboundRequest;
use crate::proxy::ProxyError;
use crate::resilience::RetryPolicy;

/// A failed upstream round trip.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),
    #[error("could not build upstream request: {0}")]
    Build(#[from] axum::http::Error),
    #[error("upstream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One upstream round trip.
pub trait Transport: Send + Sync {
    fn round_trip(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

/// Source of backends for retries.
pub trait Selector: Send + Sync {
    fn next_backend(&self) -> Option<Arc<Backend>>;
}

impl Selector for BackendPool {
    fn next_backend(&self) -> Option<Arc<Backend>> {
        BackendPool::next_backend(self)
    }
}

/// Plain HTTP/1.1 transport over the hyper-util pooled client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn round_trip(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let response: Response<Incoming> = self.client.request(request).await?;
        Ok(response.map(Body::new))
    }
}

/// Transport that retries transport failures across backends.
pub struct RetryingTransport<T, S> {
    inner: T,
    selector: Arc<S>,
    policy: RetryPolicy,
}

impl<T: Transport, S: Selector> RetryingTransport<T, S> {
    pub fn new(inner: T, selector: Arc<S>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            selector,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Forward `outbound`, starting with `first`.
    ///
    /// Returns the response together with the backend that produced it.
    pub async fn round_trip(
        &self,
        outbound: &OutboundRequest,
        first: Arc<Backend>,
    ) -> Result<(Response<Body>, Arc<Backend>), ProxyError> {
        let max_attempts = self.policy.max_attempts();
        let mut backend = first;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.delay_before(attempt);
                tracing::debug!(attempt, delay = ?delay, "Backing off before retry");
                tokio::time::sleep(delay).await;

                let next = match self.selector.next_backend() {
                    Some(b) => b,
                    None => {
                        tracing::warn!(attempt, "No available backends");
                        return Err(ProxyError::NoBackendAvailable);
                    }
                };
                if next.address() != backend.address() {
                    tracing::info!(from = %backend.address(), to = %next.address(), "Switching backend");
                }
                backend = next;
                metrics::record_retry(backend.address().as_str());
            }

            match self.attempt(outbound.to_backend(backend.address()), &backend).await {
                Ok(response) => return Ok((response, backend)),
                Err(e) => {
                    tracing::warn!(
                        backend = %backend.address(),
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "Forwarding attempt failed"
                    );
                }
            }
        }

        Err(ProxyError::RetriesExhausted {
            attempts: max_attempts,
        })
    }

    /// Forward a request whose body cannot be replayed: one attempt, no retries.
    pub async fn send_once(
        &self,
        outbound: &OutboundRequest,
        backend: Arc<Backend>,
        body: Body,
    ) -> Result<(Response<Body>, Arc<Backend>), ProxyError> {
        let request = outbound.to_backend_with_body(backend.address(), body);
        match self.attempt(request, &backend).await {
            Ok(response) => Ok((response, backend)),
            Err(e) => {
                tracing::warn!(
                    backend = %backend.address(),
                    error = %e,
                    "Streaming attempt failed, body cannot be replayed"
                );
                Err(ProxyError::RetriesExhausted { attempts: 1 })
            }
        }
    }

    /// One round trip holding a connection slot, then flip aliveness on the outcome.
    async fn attempt(
        &self,
        request: Result<Request<Body>, TransportError>,
        backend: &Arc<Backend>,
    ) -> Result<Response<Body>, TransportError> {
        let result = match request {
            Ok(request) => {
                let _conn = backend.connect();
                self.inner.round_trip(request).await
            }
            Err(e) => Err(e),
        };
        backend.set_alive(result.is_ok());
        result
    }
}
