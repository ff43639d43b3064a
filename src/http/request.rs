//! Request handling and transformation.
//!
//! # Responsibilities
//! - Build the upstream URI for a backend (scheme, authority, joined path)
//! - Attach X-Forwarded-* identification headers
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - The original request is never mutated per attempt; each attempt builds
//!   a fresh request from the buffered template
//! - `Host` is always the backend authority, the client's host travels in
//!   `X-Forwarded-Host`

use std::net::IpAddr;

use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    uri::InvalidUri,
    Uri,
};
use url::Url;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers that apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Remove hop-by-hop headers, including any named in `Connection`.
///
/// `Upgrade` is removed too since upgraded connections are not proxied.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Set X-Forwarded-For/Host/Proto from the inbound request.
///
/// The client IP is appended to any X-Forwarded-For chain the client sent.
pub fn set_forwarded_headers(headers: &mut HeaderMap, client_ip: Option<IpAddr>) {
    if let Some(ip) = client_ip {
        let prior: Vec<&str> = headers
            .get_all(&X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let chain = if prior.is_empty() {
            ip.to_string()
        } else {
            format!("{}, {}", prior.join(", "), ip)
        };
        match HeaderValue::from_str(&chain) {
            Ok(value) => {
                headers.insert(X_FORWARDED_FOR, value);
            }
            Err(e) => tracing::debug!(error = %e, "Dropping unrepresentable X-Forwarded-For"),
        }
    } else {
        headers.remove(X_FORWARDED_FOR);
    }

    match headers.get(header::HOST).cloned() {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST, host);
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}

/// `host[:port]` of a backend address.
pub fn backend_authority(backend: &Url) -> String {
    let host = backend.host_str().unwrap_or_default();
    match backend.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Target URI on `backend` for an inbound request URI.
///
/// The backend's base path is joined with the request path with exactly one
/// slash between them; both query strings are kept.
pub fn backend_uri(backend: &Url, original: &Uri) -> Result<Uri, InvalidUri> {
    let base = backend.path().trim_end_matches('/');
    let path = original.path();
    let joined = if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    };

    let query = match (backend.query(), original.query()) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => format!("?{}&{}", a, b),
        (Some(a), _) if !a.is_empty() => format!("?{}", a),
        (_, Some(b)) if !b.is_empty() => format!("?{}", b),
        _ => String::new(),
    };

    format!(
        "{}://{}{}{}",
        backend.scheme(),
        backend_authority(backend),
        joined,
        query
    )
    .parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_backend_uri_rewrites_scheme_and_host() {
        let uri = backend_uri(&url("http://10.0.0.1:8081"), &"/api/users?id=3".parse().unwrap())
            .unwrap();
        assert_eq!(uri.to_string(), "http://10.0.0.1:8081/api/users?id=3");
    }

    #[test]
    fn test_backend_uri_joins_base_path_and_queries() {
        let backend = url("http://svc/base/?token=abc");
        let uri = backend_uri(&backend, &"/items?page=2".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://svc/base/items?token=abc&page=2");

        let uri = backend_uri(&url("http://svc"), &"/".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://svc/");
    }

    #[test]
    fn test_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("1.1.1.1"));

        set_forwarded_headers(&mut headers, Some("10.1.2.3".parse().unwrap()));

        assert_eq!(headers[X_FORWARDED_FOR], "1.1.1.1, 10.1.2.3");
        assert_eq!(headers[X_FORWARDED_HOST], "example.com");
        assert_eq!(headers[X_FORWARDED_PROTO], "http");
    }

    #[test]
    fn test_forwarded_for_without_client_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("spoofed"));
        set_forwarded_headers(&mut headers, None);
        assert!(headers.get(X_FORWARDED_FOR).is_none());
        assert!(headers.get(X_FORWARDED_HOST).is_none());
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }
}
