//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderMap, HeaderValue},
    response::IntoResponse,
    Router,
};
use http_balancer::{BackendPool, BalancerConfig, HttpServer, Shutdown};
use http_balancer::resilience::RetryPolicy;
use tokio::net::TcpListener;

/// Reserve a local address with nothing listening on it.
#[allow(dead_code)]
pub fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Start a mock backend that answers every request with `name` and echoes
/// the forwarding headers it received.
#[allow(dead_code)]
pub async fn start_mock_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    start_mock_backend_on(listener, name).await
}

/// Same as `start_mock_backend` on an already bound listener.
#[allow(dead_code)]
pub async fn start_mock_backend_on(listener: TcpListener, name: &'static str) -> SocketAddr {
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(move |headers: HeaderMap| async move {
        let mut echoed = HeaderMap::new();
        for key in ["x-forwarded-for", "x-forwarded-host", "x-forwarded-proto", "host"] {
            if let Some(value) = headers.get(key) {
                echoed.insert(
                    format!("echo-{}", key).parse::<axum::http::HeaderName>().unwrap(),
                    value.clone(),
                );
            }
        }
        echoed.insert("x-backend", HeaderValue::from_static(name));
        (echoed, name).into_response()
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start the balancer in front of `backends` and return its address.
#[allow(dead_code)]
pub async fn start_balancer(
    pool: Arc<BackendPool>,
    policy: RetryPolicy,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::with_policy(&BalancerConfig::default(), pool, policy);
    let token = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, token).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}

/// Short backoff so failover tests do not spend seconds sleeping.
#[allow(dead_code)]
pub fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        backoff_step: Duration::from_millis(20),
    }
}

/// A client that never reuses connections, so each request is dispatched fresh.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
