//! Response handling and transformation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from backend responses
//! - Provide the uniform client-facing error responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the upstream body
//! - Backend failures never leak transport details to the client

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};

use crate::http::request::strip_hop_by_hop;

/// Prepare a backend response for the client.
pub fn from_backend(mut response: Response<Body>) -> Response<Body> {
    strip_hop_by_hop(response.headers_mut());
    response
}

/// Plain-text response with the given status.
pub fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// The uniform answer when no backend could serve the request.
pub fn service_unavailable() -> Response<Body> {
    plain(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
}
