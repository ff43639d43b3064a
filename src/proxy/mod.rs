//! Reverse-proxy dispatch.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → buffer body up to max_body_bytes (needed to replay on retry)
//!         larger → stream it, single attempt, no retries
//!     → rewrite.rs (select backend, X-Forwarded-*, scoped connection bump)
//!     → transport.rs RetryingTransport
//!         attempt 1 → backend chosen by the rewrite hook
//!         failure  → mark dead, sleep n * step, re-select, attempt n + 1
//!         success  → mark alive, return response
//!     → ProxyError → uniform 503 (400 for an unreadable request body)
//! ```
//!
//! # Design Decisions
//! - Backend failures are absorbed here; only exhaustion reaches the client
//! - The client never sees a raw transport error

pub mod rewrite;
pub mod transport;

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};
use futures_util::{stream, StreamExt};

use crate::http::response;
use crate::load_balancer::backend::Backend;
use crate::resilience::RetryPolicy;

pub use rewrite::{rewrite, OutboundRequest};
pub use transport::{HyperTransport, RetryingTransport, Selector, Transport, TransportError};

/// Request-terminal dispatch failures.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("no backend available")]
    NoBackendAvailable,
    #[error("all {attempts} forwarding attempts failed")]
    RetriesExhausted { attempts: u32 },
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(error = %self, "Proxy error");
        match self {
            ProxyError::NoBackendAvailable | ProxyError::RetriesExhausted { .. } => {
                response::service_unavailable()
            }
            ProxyError::BodyRead(_) => response::plain(StatusCode::BAD_REQUEST, "Bad request"),
        }
    }
}

/// Ties selection, rewriting and the retrying transport together.
pub struct Dispatcher<T, S> {
    selector: Arc<S>,
    transport: RetryingTransport<T, S>,
    max_body_bytes: usize,
}

impl<T: Transport, S: Selector> Dispatcher<T, S> {
    pub fn new(inner: T, selector: Arc<S>, policy: RetryPolicy, max_body_bytes: usize) -> Self {
        Self {
            transport: RetryingTransport::new(inner, selector.clone(), policy),
            selector,
            max_body_bytes,
        }
    }

    /// Forward one request, returning the backend that served it.
    pub async fn forward(
        &self,
        request: Request<Body>,
        client_ip: Option<IpAddr>,
    ) -> Result<(Response<Body>, Arc<Backend>), ProxyError> {
        let (parts, body) = request.into_parts();

        match read_body(body, self.max_body_bytes).await? {
            InboundBody::Buffered(body) => {
                let (outbound, backend) = rewrite(self.selector.as_ref(), parts, body, client_ip)?;
                let (upstream, backend) = self.transport.round_trip(&outbound, backend).await?;
                Ok((response::from_backend(upstream), backend))
            }
            InboundBody::Streaming(body) => {
                tracing::debug!(limit = self.max_body_bytes, "Request body not replayable, retries disabled");
                let (outbound, backend) =
                    rewrite(self.selector.as_ref(), parts, Bytes::new(), client_ip)?;
                let (upstream, backend) = self.transport.send_once(&outbound, backend, body).await?;
                Ok((response::from_backend(upstream), backend))
            }
        }
    }
}

enum InboundBody {
    /// Fully read, can be replayed on every attempt.
    Buffered(Bytes),
    /// Larger than the replay buffer: what was read so far, then the rest of the stream.
    Streaming(Body),
}

/// Read the body until it ends or grows past `limit`.
async fn read_body(body: Body, limit: usize) -> Result<InboundBody, ProxyError> {
    let mut rest = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut len = 0;

    while let Some(chunk) = rest.next().await {
        let chunk = chunk.map_err(ProxyError::BodyRead)?;
        len += chunk.len();
        chunks.push(chunk);

        if len > limit {
            let prefix = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>));
            return Ok(InboundBody::Streaming(Body::from_stream(prefix.chain(rest))));
        }
    }

    let body = if chunks.len() == 1 {
        chunks.swap_remove(0)
    } else {
        Bytes::from(chunks.concat())
    };
    Ok(InboundBody::Buffered(body))
}
