//! Rewrite hook: backend selection and request rewriting.

use std::net::IpAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use url::Url;

use crate::http::request::{backend_authority, backend_uri, set_forwarded_headers, strip_hop_by_hop};
use crate::load_balancer::backend::Backend;
use crate::proxy::transport::{Selector, TransportError};
use crate::proxy::ProxyError;

/// A buffered, header-rewritten request that can be replayed to any backend.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl OutboundRequest {
    /// Strip hop-by-hop headers and attach the X-Forwarded-* set.
    pub fn from_parts(parts: Parts, body: Bytes, client_ip: Option<IpAddr>) -> Self {
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        set_forwarded_headers(&mut headers, client_ip);

        Self {
            method: parts.method,
            uri: parts.uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build the request for one attempt against `backend`.
    ///
    /// The inbound HTTP version is not carried over; the client picks its own.
    pub fn to_backend(&self, backend: &Url) -> Result<Request<Body>, TransportError> {
        self.to_backend_with_body(backend, Body::from(self.body.clone()))
    }

    /// Same as `to_backend`, sending `body` instead of the buffered one.
    pub fn to_backend_with_body(&self, backend: &Url, body: Body) -> Result<Request<Body>, TransportError> {
        let uri = backend_uri(backend, &self.uri).map_err(axum::http::Error::from)?;
        let host = HeaderValue::from_str(&backend_authority(backend))
            .map_err(axum::http::Error::from)?;

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .body(body)?;
        *request.headers_mut() = self.headers.clone();
        request.headers_mut().insert(header::HOST, host);
        Ok(request)
    }
}

/// Select a backend and rewrite the inbound request for it.
///
/// The connection count is bumped only for the duration of this call.
pub fn rewrite<S: Selector>(
    selector: &S,
    parts: Parts,
    body: Bytes,
    client_ip: Option<IpAddr>,
) -> Result<(OutboundRequest, Arc<Backend>), ProxyError> {
    let backend = selector.next_backend().ok_or(ProxyError::NoBackendAvailable)?;
    let _conn = backend.connect();

    let outbound = OutboundRequest::from_parts(parts, body, client_ip);
    tracing::debug!(
        backend = %backend.address(),
        method = %outbound.method,
        path = %outbound.uri.path(),
        "Request rewritten"
    );

    Ok((outbound, backend))
}
